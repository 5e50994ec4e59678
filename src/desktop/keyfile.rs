use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Group(String),
    Entry {
        key: String,
        value: String,
        raw: Option<String>,
    },
    /// Comments, blank lines and anything we can't interpret; written back verbatim.
    Verbatim(String),
}

/// Line-preserving reader/writer for the freedesktop key file format.
///
/// Only the entries touched through [`KeyFile::set`] are re-rendered, so comments,
/// translations and unknown groups survive a rewrite unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    lines: Vec<Line>,
}

impl KeyFile {
    pub fn parse(contents: &str) -> Self {
        let lines = contents.lines().map(parse_line).collect();
        Self { lines }
    }

    #[cfg(test)]
    pub(crate) fn has_group(&self, group: &str) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, Line::Group(name) if name == group))
    }

    /// Last value of `key` in `group`, unescaped.
    pub fn get(&self, group: &str, key: &str) -> Option<String> {
        let mut current: Option<&str> = None;
        let mut found = None;
        for line in &self.lines {
            match line {
                Line::Group(name) => current = Some(name),
                Line::Entry { key: k, value, .. } if current == Some(group) && k == key => {
                    found = Some(value.as_str());
                }
                _ => {}
            }
        }
        found.map(unescape_value)
    }

    pub fn get_bool(&self, group: &str, key: &str) -> Option<bool> {
        match self.get(group, key)?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn set(&mut self, group: &str, key: &str, value: &str) {
        let escaped = escape_value(value);
        let mut current: Option<&str> = None;
        let mut existing = None;
        let mut insert_at = None;

        for (index, line) in self.lines.iter().enumerate() {
            match line {
                Line::Group(name) => {
                    current = Some(name);
                    if name == group {
                        insert_at = Some(index + 1);
                    }
                }
                Line::Entry { key: k, .. } if current == Some(group) => {
                    insert_at = Some(index + 1);
                    if k == key {
                        existing = Some(index);
                    }
                }
                _ => {}
            }
        }

        let entry = Line::Entry {
            key: key.to_string(),
            value: escaped,
            raw: None,
        };
        match (existing, insert_at) {
            (Some(index), _) => self.lines[index] = entry,
            (None, Some(index)) => self.lines.insert(index, entry),
            (None, None) => {
                if !self.lines.is_empty() {
                    self.lines.push(Line::Verbatim(String::new()));
                }
                self.lines.push(Line::Group(group.to_string()));
                self.lines.push(entry);
            }
        }
    }

    pub fn set_bool(&mut self, group: &str, key: &str, value: bool) {
        self.set(group, key, if value { "true" } else { "false" });
    }
}

impl fmt::Display for KeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Group(name) => writeln!(f, "[{name}]")?,
                Line::Entry {
                    raw: Some(raw), ..
                } => writeln!(f, "{raw}")?,
                Line::Entry { key, value, .. } => writeln!(f, "{key}={value}")?,
                Line::Verbatim(text) => writeln!(f, "{text}")?,
            }
        }
        Ok(())
    }
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Verbatim(raw.to_string());
    }
    if let Some(name) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return Line::Group(name.to_string());
    }
    match trimmed.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Line::Entry {
            key: key.trim().to_string(),
            value: value.trim_start().to_string(),
            raw: Some(raw.to_string()),
        },
        _ => Line::Verbatim(raw.to_string()),
    }
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (index, ch) in value.chars().enumerate() {
        match ch {
            ' ' if index == 0 => out.push_str("\\s"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# generated by waydroid
[Desktop Entry]
Type=Application
Name=Calendar
Name[de]=Kalender
Exec = waydroid app launch org.lineageos.etar
Icon=/home/user/.local/share/waydroid/data/icons/org.lineageos.etar.png

[Desktop Action new]
Name=New event
";

    #[test]
    fn reads_values_from_the_requested_group_only() {
        let file = KeyFile::parse(SAMPLE);
        assert_eq!(file.get("Desktop Entry", "Name").as_deref(), Some("Calendar"));
        assert_eq!(file.get("Desktop Entry", "Name[de]").as_deref(), Some("Kalender"));
        assert_eq!(
            file.get("Desktop Entry", "Exec").as_deref(),
            Some("waydroid app launch org.lineageos.etar")
        );
        assert_eq!(file.get("Desktop Action new", "Name").as_deref(), Some("New event"));
        assert_eq!(file.get("Desktop Entry", "NoDisplay"), None);
    }

    #[test]
    fn set_appends_into_existing_group_and_keeps_other_lines() {
        let mut file = KeyFile::parse(SAMPLE);
        file.set_bool("Desktop Entry", "NoDisplay", true);
        let rendered = file.to_string();

        assert!(rendered.starts_with("# generated by waydroid\n"));
        assert!(rendered.contains("Exec = waydroid app launch org.lineageos.etar\n"));
        assert!(rendered.contains(
            "Icon=/home/user/.local/share/waydroid/data/icons/org.lineageos.etar.png\nNoDisplay=true\n"
        ));
        assert!(rendered.contains("[Desktop Action new]\nName=New event\n"));
        assert_eq!(KeyFile::parse(&rendered).get_bool("Desktop Entry", "NoDisplay"), Some(true));
    }

    #[test]
    fn set_replaces_existing_entry_in_place() {
        let mut file = KeyFile::parse("[Desktop Entry]\nNoDisplay=true\nName=App\n");
        file.set_bool("Desktop Entry", "NoDisplay", false);
        assert_eq!(file.to_string(), "[Desktop Entry]\nNoDisplay=false\nName=App\n");
    }

    #[test]
    fn set_creates_missing_group() {
        let mut file = KeyFile::parse("# empty\n");
        file.set("Desktop Entry", "Name", "App");
        assert_eq!(file.to_string(), "# empty\n\n[Desktop Entry]\nName=App\n");
        assert!(file.has_group("Desktop Entry"));
    }

    #[test]
    fn escapes_survive_a_rewrite() {
        let mut file = KeyFile::parse("[Desktop Entry]\n");
        file.set("Desktop Entry", "Comment", " two\nlines\\");
        let reparsed = KeyFile::parse(&file.to_string());
        assert_eq!(
            reparsed.get("Desktop Entry", "Comment").as_deref(),
            Some(" two\nlines\\")
        );
    }
}

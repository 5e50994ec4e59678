use super::event::ViewEvent;
use super::model::ViewState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid view transition: from {from:?} using event {event:?}")]
    InvalidStateTransition { from: ViewState, event: ViewEvent },
}

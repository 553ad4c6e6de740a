mod input;
mod search_input;
mod ticket_filters;
mod ticket_form;

pub use input::{InputResult, TextInput};
pub use search_input::{SearchEvent, SearchInput};
pub use ticket_filters::{EmptyKind, ListControls, TicketFilters};
pub use ticket_form::{FormEvent, NewTicketForm};

/// Generic result type for component key handling.
///
/// This enum standardizes how components communicate key handling results
/// to their parent views, replacing component-specific result enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}

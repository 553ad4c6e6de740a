mod dashboard;
mod login;
mod settings;
mod ticket_detail;
mod tickets;
mod users;

pub use dashboard::DashboardView;
pub use login::LoginView;
pub use settings::SettingsView;
pub use ticket_detail::TicketDetailView;
pub use tickets::TicketsView;
pub use users::UsersView;

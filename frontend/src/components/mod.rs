mod add_environment_dialog;
mod cost_tile;
mod environment_card;
mod navigation;
mod protected_route;
mod status_badge;
mod toast;

pub use add_environment_dialog::AddEnvironmentDialog;
pub use cost_tile::CostTile;
pub use environment_card::EnvironmentCard;
pub use navigation::Navigation;
pub use protected_route::ProtectedRoute;
pub use status_badge::ContainerRow;
pub use toast::ToastProvider;

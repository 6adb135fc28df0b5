pub mod menu_items;
pub mod orders;
pub mod settings;
pub mod signage_items;
pub mod users;

pub use menu_items::Entity as MenuItems;
pub use orders::Entity as Orders;
pub use settings::Entity as Settings;
pub use signage_items::Entity as SignageItems;
pub use users::Entity as Users;

pub mod assets;
pub mod audit;
pub mod auth;
pub mod health;
pub mod inventory;
pub mod locations;
pub mod tenant;
pub mod users;
pub mod work_orders;

pub mod db_status;
pub mod health;
pub mod info;

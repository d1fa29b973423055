pub mod snowflake;
pub mod validation;

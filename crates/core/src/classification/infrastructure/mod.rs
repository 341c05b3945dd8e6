pub mod fixed_goalpost_locator;

#![allow(dead_code)]

pub mod fake_browser;
pub mod storefront;

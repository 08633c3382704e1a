pub mod admin;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod cleanup;
pub mod payment;
pub mod pricing;
pub mod schedule;
pub mod tmdb;

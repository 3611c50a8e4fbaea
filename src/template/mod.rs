// ABOUTME: Template engine module for request body rendering
// ABOUTME: Wraps handlebars with the request helpers and a template directory

pub mod engine;
pub mod error;
pub mod helpers;

pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};

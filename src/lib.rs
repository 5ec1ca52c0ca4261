//! Operator dashboard for the SmartSNI DoH/SNI proxy admin panel.
//!
//! The [`dashboard::Dashboard`] controller owns the session lifecycle and
//! the refresh loop, talks to the panel through [`api::PanelApi`], keeps the
//! credential in a [`session::SessionStore`], and hands display-ready data
//! to a [`render::Renderer`].

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod render;
pub mod session;

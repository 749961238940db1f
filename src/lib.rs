//! Detailing Membership - membership, access code and discount code backend
//! for a mobile auto-detailing business.
//!
//! Hexagonal layout: `domain` holds the pure model, `ports` the traits the
//! application depends on, `adapters` the implementations (in-memory, Postgres,
//! hosted REST, relational RPC, Stripe, email, HTTP), and `application` the
//! command handlers and session state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

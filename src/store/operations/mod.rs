//! SQL operations, generic over pooled clients and open transactions

pub mod messages;
pub mod readings;
pub mod sessions;

pub use messages::{insert_message, session_messages};
pub use readings::{
    insert_food_event, insert_glucose_reading, latest_glucose_reading, readings_between,
    NewFoodEvent, NewGlucoseReading,
};
pub use sessions::{close_session, find_session, list_sessions, upsert_session};

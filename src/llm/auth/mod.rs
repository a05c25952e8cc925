//! Google credential helpers

pub mod adc;

pub mod counters;
pub mod participants;
pub mod registrations;

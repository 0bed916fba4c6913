mod adapters;
mod common;

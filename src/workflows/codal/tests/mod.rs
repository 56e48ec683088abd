mod common;
mod detection;

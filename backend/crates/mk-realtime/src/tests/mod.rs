mod error;
mod fakes;
mod logger;
mod property_tests;
mod retry;

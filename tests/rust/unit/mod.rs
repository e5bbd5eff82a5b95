//! Unit test harness: schema generation and statement translation.

mod schema_generation_tests;
mod translate_create_tests;
mod translate_read_tests;
mod translate_update_tests;
mod validation_tests;

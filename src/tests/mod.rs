// Test modules for the WhatsApp dashboard
// Each module covers the corresponding source module; `support` holds
// fixtures and the recording transport shared by the session tests.

mod support;

mod format_tests;
mod models_tests;
mod storage_tests;
mod tui_tests;

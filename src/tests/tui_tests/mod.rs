// TUI Tests Module - Testing the public tui module
// Tests organized by TUI module structure:
// - app_tests: App key handling, selection and scroll state
// - types_tests: Focus order and theme palettes
// - ui_tests: UI helper functions and full-frame rendering

mod app_tests;
mod types_tests;
mod ui_tests;

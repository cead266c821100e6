// Storage Tests Module - Testing the storage module
// Tests organized by storage module functionality:
// - settings_tests: Settings defaults, persistence and endpoint overrides
// - preferences_tests: Preferences file and PreferencesManager (theme, auto-save, reload)

mod settings_tests;
mod preferences_tests;

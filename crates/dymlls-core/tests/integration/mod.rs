mod diagnostics_tests;
mod semantic_tokens_tests;
mod session_tests;

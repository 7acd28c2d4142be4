pub mod test_bank_prompt;

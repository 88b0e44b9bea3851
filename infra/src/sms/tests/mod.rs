mod create_service_tests;
mod kavenegar_tests;

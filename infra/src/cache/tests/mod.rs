mod memory_store_tests;

pub mod known_customers;

/// Attendance check-in, check-out and monthly reports
pub mod attendance;
/// Guest booking requests
pub mod booking;
/// Product catalogue CSV import and export
pub mod catalog_csv;
/// Customers, visits and store credit
pub mod customer;
/// Staff records
pub mod employee;
/// Operating expenses
pub mod expense;
/// Stock movements and the inventory log
pub mod inventory;
/// Room orders and the kitchen board
pub mod kitchen;
/// Decimal money helpers
pub mod money;
/// Outlets and outlet settings
pub mod outlet;
/// Monthly payroll
pub mod payroll;
/// Calendar period helpers
pub mod period;
/// Product catalogue
pub mod product;
/// Dashboard and financial summary
pub mod report;
/// Karaoke rooms and the room board
pub mod room;
/// Counter sales, voids and daily summaries
pub mod sale;
/// Room sessions, billing and checkout
pub mod session;
/// Mapping users to outlets
pub mod tenant;

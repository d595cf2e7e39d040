//! Entity module - Contains all SeaORM entity definitions for the database.
//! Every business table carries an `outlet_id` column that scopes it to one tenant.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance;
pub mod booking_request;
pub mod credit_payment;
pub mod customer;
pub mod employee;
pub mod expense;
pub mod inventory_log;
pub mod outlet;
pub mod outlet_setting;
pub mod payroll;
pub mod product;
pub mod room;
pub mod room_order;
pub mod room_order_item;
pub mod room_session;
pub mod sale_item;
pub mod sale_transaction;
pub mod user;

pub use attendance::Entity as Attendance;
pub use booking_request::{BookingStatus, Entity as BookingRequest};
pub use credit_payment::Entity as CreditPayment;
pub use customer::Entity as Customer;
pub use employee::{Entity as Employee, PaymentType};
pub use expense::Entity as Expense;
pub use inventory_log::{Entity as InventoryLog, InventoryAction};
pub use outlet::Entity as Outlet;
pub use outlet_setting::Entity as OutletSetting;
pub use payroll::{Entity as Payroll, PayrollStatus};
pub use product::Entity as Product;
pub use room::Entity as Room;
pub use room_order::Entity as RoomOrder;
pub use room_order_item::Entity as RoomOrderItem;
pub use room_session::{Entity as RoomSession, SessionStatus};
pub use sale_item::Entity as SaleItem;
pub use sale_transaction::{Entity as SaleTransaction, PaymentMethod, SaleSource, SaleStatus};
pub use user::Entity as User;

pub mod email;
pub mod referrals;

// passfill state managers

pub mod tab_manager;

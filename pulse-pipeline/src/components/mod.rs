pub mod clicked_state_filter;
pub mod membership_filter;
pub mod top_k_selector;

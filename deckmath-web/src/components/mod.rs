pub mod answer_form;
pub mod card_table;
pub mod control_bar;
pub mod hint_box;
pub mod settings_panel;
pub mod stats_panel;
pub mod status_bar;
pub mod summary_panel;

use super::components::TaskCard;
use super::messages::Message;
use super::task::{Draft, Task};
use crate::msg_print;
use anyhow::Result;
use prettytable::{format, row, Table};

pub struct View {}

impl View {
    /// Prints the stored tasks, one block per main task.
    pub fn tasks(cards: &[TaskCard<Task>]) -> Result<()> {
        msg_print!(Message::TasksHeader, true);
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.set_titles(row!["ID", "", "TASK", "PRIORITY", "CREATED"]);
        for card in cards {
            let main = card.main_button();
            table.add_row(row![
                card.maintask.id,
                main.glyph(),
                main.title,
                card.maintask.priority().unwrap_or_default(),
                card.maintask.created_time.format("%Y-%m-%d %H:%M")
            ]);
            for (subtask, button) in card.subtasks.iter().zip(card.subtask_buttons()) {
                table.add_row(row![subtask.id, button.glyph(), format!("  {}", button.title), "", ""]);
            }
        }
        table.printstd();

        Ok(())
    }

    /// Prints an unsaved plan.
    pub fn preview(card: &TaskCard<Draft>) -> Result<()> {
        msg_print!(Message::PreviewHeader, true);
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);

        let main = card.main_button();
        table.add_row(row![main.glyph(), bFg->main.title]);
        for (index, button) in card.subtask_buttons().enumerate() {
            table.add_row(row![button.glyph(), format!("{}. {}", index + 1, button.title)]);
        }
        table.printstd();

        if card.show_generated_badge {
            msg_print!(Message::GeneratedWithGemini);
        }
        msg_print!(Message::SubtasksCount(card.subtasks.len()));

        Ok(())
    }

    /// Prints the stored tasks as JSON.
    pub fn json(cards: &[TaskCard<Task>]) -> Result<()> {
        let groups: Vec<_> = cards.iter().map(TaskCard::to_group).collect();
        println!("{}", serde_json::to_string_pretty(&groups)?);
        Ok(())
    }
}

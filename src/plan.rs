//! Expand a project document into a list of cards and checklists.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::model::board::TrelloList;
use crate::trello::{self, TrelloApi};

pub const OVERVIEW_CARD: &str = "Project Overview";
pub const TASKS_CHECKLIST: &str = "Tasks";
pub const SUBTASKS_CHECKLIST: &str = "Subtasks";

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPlan {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

impl ProjectPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let plan: ProjectPlan = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid project plan in {}", path.display()))?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Project name cannot be empty");
        }
        for phase in &self.phases {
            if phase.name.trim().is_empty() {
                bail!("Phase names cannot be empty");
            }
            if phase.tasks.iter().any(|t| t.name.trim().is_empty()) {
                bail!("Task names cannot be empty (phase '{}')", phase.name);
            }
        }
        Ok(())
    }

    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }
}

#[derive(Debug)]
pub struct PlanReport {
    pub list: TrelloList,
    pub cards: usize,
    pub checklists: usize,
    pub items: usize,
}

/// Create the project list on `board_id` and fill it in document order.
pub async fn build_plan(
    api: &dyn TrelloApi,
    board_id: &str,
    plan: &ProjectPlan,
) -> Result<PlanReport> {
    let list = api.create_list(board_id, &plan.name, None).await?;
    let mut report = PlanReport {
        list,
        cards: 0,
        checklists: 0,
        items: 0,
    };
    let list_id = report.list.id.clone();

    trello::create_card(api, &list_id, OVERVIEW_CARD, &plan.description).await?;
    report.cards += 1;

    for phase in &plan.phases {
        let phase_card = trello::create_card(api, &list_id, &phase.name, &phase.description).await?;
        report.cards += 1;

        let tasks = api.create_checklist(&phase_card.id, TASKS_CHECKLIST).await?;
        report.checklists += 1;

        for task in &phase.tasks {
            api.add_checklist_item(&tasks.id, &task.name).await?;
            report.items += 1;

            let task_card = trello::create_card(api, &list_id, &task.name, &task.description).await?;
            report.cards += 1;

            if task.subtasks.is_empty() {
                continue;
            }
            let subtasks = api
                .create_checklist(&task_card.id, SUBTASKS_CHECKLIST)
                .await?;
            report.checklists += 1;
            for subtask in &task.subtasks {
                api.add_checklist_item(&subtasks.id, subtask).await?;
                report.items += 1;
            }
        }
    }

    Ok(report)
}

//! User listing and task status commands — `taskdeck users`, `taskdeck set-status`.

use anyhow::{Context, Result};
use console::style;

use taskdeck::admin::{AdminClient, Project, TaskStatus, User, filter_users};
use taskdeck::config::DeckConfig;
use taskdeck::ui::icons::{CHECK, FOLDER, USER};

fn admin_client(config: &DeckConfig) -> AdminClient {
    AdminClient::new(config.api_base(), config.token())
}

pub async fn cmd_users(config: &DeckConfig, query: Option<&str>, json: bool) -> Result<()> {
    let users = admin_client(config)
        .list_users()
        .await
        .context("Failed to load users")?;
    let users = filter_users(&users, query.unwrap_or_default());

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    for user in &users {
        print_user(user);
    }
    Ok(())
}

fn print_user(user: &User) {
    println!();
    println!(
        "{}{} {} {}",
        USER,
        style(&user.name).bold(),
        style(&user.email).dim(),
        style(format!("(tg {})", user.tg_id)).dim()
    );
    if user.projects.is_empty() {
        println!("    {}", style("no projects").dim());
    }
    for project in &user.projects {
        print_project(project);
    }
}

fn print_project(project: &Project) {
    let percent = project.completion_percent();
    let percent_str = format!("{}%", percent);
    let percent_styled = if percent == 100 {
        style(percent_str).green().bold()
    } else {
        style(percent_str).yellow()
    };
    println!(
        "  {}{} {} {}",
        FOLDER,
        style(&project.title).cyan(),
        style(format!("#{}", project.id)).dim(),
        percent_styled
    );
    if !project.description.is_empty() {
        println!("      {}", style(&project.description).dim());
    }
    for task in project.ordered_tasks() {
        let mark = match task.status {
            TaskStatus::Done => style("[x]").green(),
            TaskStatus::InProgress => style("[~]").yellow(),
            TaskStatus::Pending => style("[ ]").dim(),
        };
        println!(
            "      {} {} {}",
            mark,
            task.title,
            style(format!("#{}", task.id)).dim()
        );
    }
}

pub async fn cmd_set_status(config: &DeckConfig, task_id: i64, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse()?;
    admin_client(config)
        .set_task_status(task_id, status)
        .await
        .with_context(|| format!("Failed to update task {}", task_id))?;
    println!(
        "{}Task {} is now {}",
        CHECK,
        style(task_id).bold(),
        style(status).cyan()
    );
    Ok(())
}

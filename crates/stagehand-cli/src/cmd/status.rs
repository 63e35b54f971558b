use crate::cmd::open_plan;
use crate::output::{print_json, print_table};
use anyhow::Context;
use serde::Serialize;
use stagehand_core::{
    fs::OsFileSystem,
    plan::{PlanContext, PlanState, Workspace},
    templates::EmbeddedTemplates,
    transition::{plan_step, Step},
    types::{self, Stage},
    StagehandError,
};
use std::path::Path;

#[derive(Serialize)]
struct PlanStatus<'a> {
    plan: &'a str,
    stage: Stage,
    state: &'a PlanState,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked: Option<String>,
}

pub fn run(root: &Path, plan: Option<&str>, json: bool) -> anyhow::Result<()> {
    if plan.is_none() {
        let workspace = Workspace::load(root).context("failed to load config")?;
        let names = workspace.list_plans(&OsFileSystem)?;
        if names.len() > 1 {
            return list(&workspace, &names, json);
        }
    }
    let (_, ctx) = open_plan(root, plan)?;
    show(&ctx, json)
}

fn list(workspace: &Workspace, names: &[String], json: bool) -> anyhow::Result<()> {
    let plans = names
        .iter()
        .map(|name| workspace.load_plan(&OsFileSystem, name))
        .collect::<Result<Vec<_>, StagehandError>>()?;

    if json {
        let rows: Vec<_> = plans
            .iter()
            .map(|p| {
                serde_json::json!({
                    "plan": p.name,
                    "stage": p.state.active_stage(),
                    "finished": p.state.is_finished(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    let rows = plans
        .iter()
        .map(|p| {
            let done = p.state.phases.iter().filter(|ph| ph.is_complete).count();
            let stage = if p.state.is_finished() {
                "finished".to_string()
            } else {
                p.state.active_stage().to_string()
            };
            vec![
                p.name.clone(),
                stage,
                format!("{done}/{}", p.state.phases.len()),
            ]
        })
        .collect();
    print_table(&["PLAN", "STAGE", "PHASES"], rows);
    Ok(())
}

fn show(ctx: &PlanContext, json: bool) -> anyhow::Result<()> {
    let state = &ctx.state;
    let (next, blocked) = match plan_step(ctx, &OsFileSystem, &EmbeddedTemplates) {
        Ok(step) => (Some(step), None),
        Err(e) => (None, Some(e.to_string())),
    };

    if json {
        return print_json(&PlanStatus {
            plan: &ctx.name,
            stage: state.active_stage(),
            state,
            next,
            blocked,
        });
    }

    println!("Plan:   {}", ctx.name);
    println!("Stage:  {}", state.active_stage());
    let flags = [
        types::STATE_ID,
        types::REFERENCES_ID,
        types::SYSTEM_ANALYSIS_ID,
        types::KEY_DECISIONS_ID,
        types::PHASE_ANALYSIS_ID,
        types::PHASE_DETAILS_ID,
    ];
    println!();
    for id in flags {
        let mark = if state.flag(id).unwrap_or(false) { "x" } else { " " };
        println!("  [{mark}] {id}");
    }

    if !state.phases.is_empty() {
        println!();
        let rows = state
            .phases
            .iter()
            .map(|p| {
                vec![
                    p.phase_number.to_string(),
                    p.phase_name.clone(),
                    if p.is_complete { "done" } else { "open" }.to_string(),
                    if p.is_pull_request_boundary { "yes" } else { "" }.to_string(),
                ]
            })
            .collect();
        print_table(&["PHASE", "NAME", "STATUS", "PR BOUNDARY"], rows);
    }

    println!();
    match (next, blocked) {
        (Some(step), _) => println!("Next:   {step}"),
        (None, Some(reason)) => println!("Blocked: {reason}"),
        (None, None) => {}
    }
    Ok(())
}

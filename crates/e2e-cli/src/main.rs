//! Command line front end for the built-in scenario pipelines

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use e2e_scenario::{
    calculate_scenario_variations_with, init_logging, run_pipeline_from_env, scenario_name, PipelineOptions,
    ScenarioDescription, StepFactory, TestContext,
};
use e2e_test_utils::{install_fixture_accounts, pipeline, PIPELINES};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ListedScenario<'a> {
    name: String,
    description: &'a ScenarioDescription,
}

fn cli() -> Command {
    let pipeline_arg = Arg::new("pipeline")
        .long("pipeline")
        .required(true)
        .value_parser(PIPELINES.to_vec())
        .help("Built-in pipeline to use");

    Command::new("e2e")
        .version(e2e_scenario::VERSION)
        .about("Discover and run end-to-end scenario pipelines")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List the scenarios a pipeline expands to without running them")
                .arg(pipeline_arg.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run every scenario of a pipeline and print the report")
                .arg(pipeline_arg)
                .arg(
                    Arg::new("serial")
                        .long("serial")
                        .action(ArgAction::SetTrue)
                        .help("Run scenarios one at a time"),
                ),
        )
}

fn load(args: &ArgMatches) -> Result<(&str, Vec<StepFactory>)> {
    let name = args
        .get_one::<String>("pipeline")
        .ok_or_else(|| anyhow!("--pipeline is required"))?;
    let steps = pipeline(name).ok_or_else(|| anyhow!("unknown pipeline {name}"))?;
    install_fixture_accounts().context("installing fixture accounts")?;
    tracing::debug!(pipeline = %name, steps = steps.len(), "loaded pipeline");
    Ok((name.as_str(), steps))
}

fn list(args: &ArgMatches) -> Result<()> {
    let (name, steps) = load(args)?;
    let ctx = TestContext::from_env(name).context("reading E2E_* configuration")?;
    let descriptions = calculate_scenario_variations_with(&steps, ctx.config())?;

    if args.get_flag("json") {
        let listed: Vec<_> = descriptions
            .iter()
            .enumerate()
            .map(|(index, description)| ListedScenario {
                name: scenario_name(&ctx, description, index),
                description,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
    } else {
        for (index, description) in descriptions.iter().enumerate() {
            println!("{}", scenario_name(&ctx, description, index));
        }
        println!("{} scenarios", descriptions.len());
    }
    Ok(())
}

fn run(args: &ArgMatches) -> Result<bool> {
    let (name, steps) = load(args)?;
    let options = if args.get_flag("serial") {
        PipelineOptions::serial()
    } else {
        PipelineOptions::default()
    };

    let report = run_pipeline_from_env(name, &steps, options).map_err(|err| {
        let hint = if err.is_discovery_failure() {
            "a step failed while reporting its variations; no scenario ran"
        } else {
            "reading E2E_* configuration"
        };
        anyhow::Error::new(err).context(hint)
    })?;
    println!("{}", report.summary());
    for failure in report.failures() {
        println!("\n--- {}\n{}", failure.name, failure.outcome);
    }
    Ok(report.passed())
}

fn main() -> Result<()> {
    init_logging();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("list", args)) => list(args),
        Some(("run", args)) => {
            if !run(args)? {
                std::process::exit(1);
            }
            Ok(())
        }
        _ => Err(anyhow!("unknown command")),
    }
}

use anyhow::{bail, Context, Result};
use clap::{crate_version, App, Arg};
use dftb2nnsk::defaults::{CONFIG_FILE_NAME, PLOT_NSAMPLE};
use dftb2nnsk::io::{read_input, write_header, Configuration};
use dftb2nnsk::utils::Timer;
use dftb2nnsk::{Dftb2Nnsk, OptimizeOptionsBuilder};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    let matches = App::new("dftb2nnsk")
        .version(crate_version!())
        .about("Fits NNSK hopping and overlap parameters to DFTB Slater-Koster tables")
        .arg(
            Arg::new("config")
                .help("configuration file, written with default values if it does not exist")
                .index(1)
                .default_value(CONFIG_FILE_NAME),
        )
        .arg(
            Arg::new("restart")
                .help("continue from a checkpoint file or directory")
                .long("restart")
                .takes_value(true)
                .value_name("CKPT"),
        )
        .arg(
            Arg::new("plot")
                .help("plot the integrals of a bond type, e.g. B-N")
                .long("plot")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("A-B"),
        )
        .get_matches();

    write_header();
    let timer: Timer = Timer::start();

    let config_file: &str = matches.value_of("config").unwrap_or(CONFIG_FILE_NAME);
    let config: Configuration = read_input(config_file)
        .with_context(|| format!("failed to read the configuration {}", config_file))?;
    if config.model.basis.is_empty() {
        bail!(
            "no basis given in {}, add a [model.basis] table like B = [\"2s\", \"2p\"]",
            config_file
        );
    }
    let skdata: &Path = Path::new(&config.skdata);

    let mut fit: Dftb2Nnsk = match matches.value_of("restart") {
        Some(checkpoint) => Dftb2Nnsk::load(checkpoint, skdata)
            .with_context(|| format!("failed to restart from {}", checkpoint))?,
        None => Dftb2Nnsk::new(config.model.clone(), skdata)
            .context("failed to set up the fit")?,
    };
    if matches.is_present("restart") && fit.config() != &config.model {
        warn!("the model options of the checkpoint differ from the configuration, the checkpoint is used");
    }

    let output_dir: PathBuf = PathBuf::from(&config.output.directory);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut builder = OptimizeOptionsBuilder::from_train_options(&config.train_options)?;
    builder.set_checkpoint_dir(&output_dir);
    fit.optimize(&builder.build()).context("the optimization failed")?;

    fit.save(&output_dir).context("failed to write the checkpoint")?;
    let json_file: PathBuf = output_dir.join(&config.output.json_file);
    let model = fit.to_json()?;
    fs::write(&json_file, serde_json::to_string_pretty(&model)?)
        .with_context(|| format!("failed to write {}", json_file.display()))?;
    info!("NNSK model written to {}", json_file.display());

    let mut bonds: Vec<String> = config.output.plot.clone();
    if let Some(values) = matches.values_of("plot") {
        bonds.extend(values.map(String::from));
    }
    for bond in bonds.iter() {
        let mut atoms = bond.splitn(2, '-');
        let atom_a: &str = atoms.next().unwrap_or_default();
        let atom_b: Option<&str> = atoms.next();
        fit.visualize(atom_a, atom_b, None, None, PLOT_NSAMPLE, &output_dir)
            .with_context(|| format!("failed to plot the bond type {}", bond))?;
    }

    info!("{:-^80}", "");
    info!("{}", timer);
    info!("{:-^80}", "");
    Ok(())
}

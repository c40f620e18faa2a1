use chrono::Local;
use clap::crate_version;
use log::info;

pub fn write_header() {
    info!("{: ^80}", "-----------------");
    info!("{: ^80}", "DFTB2NNSK");
    info!("{: ^80}", "-----------------");
    let mut version_string: String = "version: ".to_owned();
    version_string.push_str(crate_version!());
    info!("{: ^80}", version_string);
    info!("{: ^80}", "");
    info!("{: ^80}", "::::::::::::::::::::::::::::::::::::::::::");
    info!("{: ^80}", "::  Slater-Koster integrals from DFTB   ::");
    info!("{: ^80}", "::     fitted to NNSK hopping models    ::");
    info!("{: ^80}", "::::::::::::::::::::::::::::::::::::::::::");
    info!("{: ^80}", "");
    info!(
        "{: ^80}",
        format!("started: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    );
    info!("{: ^80}", "");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod audio;
pub mod burn;
pub mod checksum;
pub mod fetch;
pub mod image;
pub mod session;

use anyhow::Result;
use burner_engine::EngineConfig;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute or verify the checksum of an image or audio file
    Checksum(checksum::ChecksumArgs),
    /// Copy a remote URI locally through the configured mirrors
    Fetch(fetch::FetchArgs),
    /// Build an ISO9660 image from graft points
    Image(image::ImageArgs),
    /// Print the size an image would have
    Size(image::SizeArgs),
    /// Extract CD-audio tracks from WAV or raw PCM files
    Audio(audio::AudioArgs),
    /// Record an image and/or audio tracks
    Burn(burn::BurnArgs),
    /// Blank a rewritable disc
    Blank(burn::BlankArgs),
}

pub async fn handle(command: Command, config: EngineConfig) -> Result<()> {
    match command {
        Command::Checksum(args) => checksum::handle(args, config).await,
        Command::Fetch(args) => fetch::handle(args, config).await,
        Command::Image(args) => image::handle_image(args, config).await,
        Command::Size(args) => image::handle_size(args, config).await,
        Command::Audio(args) => audio::handle(args, config).await,
        Command::Burn(args) => burn::handle_burn(args, config).await,
        Command::Blank(args) => burn::handle_blank(args, config).await,
    }
}

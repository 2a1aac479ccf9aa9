// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DisplayPreference, TracingConfig, WriterConfig, rolling_file_appender_impl};
use miette::IntoDiagnostic as _;
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt as _, registry::LookupSpan,
                         util::SubscriberInitExt as _};

/// Type alias for a boxed layer.
pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Initializes the global tracing subscriber from `tracing_config`.
///
/// Returns `Ok(())` without installing anything if the writer config is
/// [`WriterConfig::None`].
///
/// # Errors
///
/// Returns an error if the log file can't be created, or a global subscriber has
/// already been installed.
pub fn try_initialize_logging_global(tracing_config: TracingConfig) -> miette::Result<()> {
    if tracing_config.writer_config == WriterConfig::None {
        return Ok(());
    }
    let layers = try_create_layers(&tracing_config)?;
    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .into_diagnostic()
}

/// Returns the layers. This does not initialize the tracing system.
///
/// Once you have the layers, you can run the following:
/// `try_create_layers(..).map(|layers| tracing_subscriber::registry().with(layers).init());`
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_create_layers(
    tracing_config: &TracingConfig,
) -> miette::Result<Vec<Box<DynLayer<tracing_subscriber::Registry>>>> {
    let mut return_it: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // Set the level filter from the tracing configuration. This is needed if you add
    // more layers which don't have a level filter.
    return_it.push(Box::new(tracing_config.get_level_filter()));

    if let Some(layer) = try_create_display_layer(
        tracing_config.get_level_filter(),
        tracing_config.get_writer_config(),
    ) {
        return_it.push(layer);
    }

    if let Some(layer) = try_create_file_layer(
        tracing_config.get_level_filter(),
        tracing_config.get_writer_config(),
    )? {
        return_it.push(layer);
    }

    Ok(return_it)
}

/// This erases the concrete type of the writer, and returns a boxed layer.
#[must_use]
pub fn try_create_display_layer<S>(
    level_filter: LevelFilter,
    writer_config: WriterConfig,
) -> Option<Box<DynLayer<S>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let fmt_layer = tracing_subscriber::fmt::layer().with_thread_names(true);

    match writer_config {
        WriterConfig::DisplayAndFile(display_pref, _)
        | WriterConfig::Display(display_pref) => match display_pref {
            DisplayPreference::Stdout => Some(Box::new(
                fmt_layer
                    .with_writer(std::io::stdout)
                    .with_filter(level_filter),
            )),
            DisplayPreference::Stderr => Some(Box::new(
                fmt_layer
                    .with_writer(std::io::stderr)
                    .with_filter(level_filter),
            )),
        },
        WriterConfig::None | WriterConfig::File(_) => None,
    }
}

/// This erases the concrete type of the writer, and returns a boxed layer.
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_create_file_layer<S>(
    level_filter: LevelFilter,
    writer_config: WriterConfig,
) -> miette::Result<Option<Box<DynLayer<S>>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    // No ANSI colors in the log file.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_names(true)
        .with_ansi(false);

    Ok(match writer_config {
        WriterConfig::DisplayAndFile(_, tracing_log_file_path_and_prefix)
        | WriterConfig::File(tracing_log_file_path_and_prefix) => {
            let file =
                rolling_file_appender_impl::try_create(&tracing_log_file_path_and_prefix)?;
            Some(Box::new(
                fmt_layer.with_writer(file).with_filter(level_filter),
            ))
        }
        WriterConfig::None | WriterConfig::Display(_) => None,
    })
}

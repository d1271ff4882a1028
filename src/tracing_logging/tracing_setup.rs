/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

use tracing_core::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, Layer,
};

use crate::{
    tracing_logging::rolling_file_appender_impl, DisplayPreference, TracingConfig,
    WriterConfig,
};

pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
#[macro_export]
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(true)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    };
}

/// Simply initialize the tracing system with the provided [`TracingConfig`].
pub fn init(tracing_config: TracingConfig) -> miette::Result<()> {
    try_create_layers(tracing_config)
        .map(|layers| tracing_subscriber::registry().with(layers).init())
}

/// Returns the layers; does not initialize the tracing system. Don't forget to do
/// that manually by calling `init` on the composed registry.
pub fn try_create_layers(
    tracing_config: TracingConfig,
) -> miette::Result<Vec<Box<DynLayer<tracing_subscriber::Registry>>>> {
    let level_filter = tracing_config.get_level_filter();
    let writer_config = tracing_config.get_writer_config();

    let mut layers: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // The level filter comes first so any additional layers inherit it.
    layers.push(Box::new(level_filter));

    if let Some(layer) = try_create_display_layer(&writer_config, level_filter)? {
        layers.push(layer);
    }
    if let Some(layer) = try_create_file_layer(&writer_config, level_filter)? {
        layers.push(layer);
    }

    Ok(layers)
}

/// This erases the concrete type of the writer and returns a boxed layer, which is
/// useful for composition of layers.
pub fn try_create_display_layer<S>(
    writer_config: &WriterConfig,
    level_filter: LevelFilter,
) -> miette::Result<Option<Box<DynLayer<S>>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let preferred_display = match writer_config {
        WriterConfig::Display(preference)
        | WriterConfig::DisplayAndFile(preference, _) => preference.clone(),
        WriterConfig::File(_) => return Ok(None),
    };

    let fmt_layer = create_fmt!();

    Ok(Some(match preferred_display {
        DisplayPreference::Stdout => Box::new(
            fmt_layer
                .with_writer(std::io::stdout)
                .with_filter(level_filter),
        ),
        DisplayPreference::Stderr => Box::new(
            fmt_layer
                .with_writer(std::io::stderr)
                .with_filter(level_filter),
        ),
        DisplayPreference::SharedWriter(shared_writer) => {
            let tracing_writer = move || -> Box<dyn std::io::Write> {
                Box::new(shared_writer.clone())
            };
            Box::new(
                fmt_layer
                    .with_writer(tracing_writer)
                    .with_filter(level_filter),
            )
        }
    }))
}

/// This erases the concrete type of the writer and returns a boxed layer, which is
/// useful for composition of layers.
pub fn try_create_file_layer<S>(
    writer_config: &WriterConfig,
    level_filter: LevelFilter,
) -> miette::Result<Option<Box<DynLayer<S>>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let path = match writer_config {
        WriterConfig::File(path) | WriterConfig::DisplayAndFile(_, path) => path.clone(),
        WriterConfig::Display(_) => return Ok(None),
    };

    let fmt_layer = create_fmt!();
    let file = rolling_file_appender_impl::try_create(path.as_str())?;

    Ok(Some(Box::new(
        fmt_layer.with_writer(file).with_filter(level_filter),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_config_creates_filter_and_display_layers() {
        let config = TracingConfig::new_display(DisplayPreference::Stdout);
        let layers = try_create_layers(config).unwrap();
        assert_eq!(layers.len(), 2);
    }

    #[test]
    fn test_file_and_display_config_creates_all_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        let config = TracingConfig::new_file_and_display(
            Some(path.display().to_string()),
            DisplayPreference::Stderr,
        );
        let layers = try_create_layers(config).unwrap();
        assert_eq!(layers.len(), 3);
    }
}

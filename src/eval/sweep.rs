use std::path::Path;

use log::warn;
use plotters::prelude::*;
use sim_lib::config::HierarchyConfig;
use sim_lib::memory::{Geometry, InclusiveHierarchy};
use sim_lib::run_wrapper::{fetch_operations, run_trace, RunSummary};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let param_tokens: Vec<String> = std::env::args().collect();
    let config_path = param_tokens
        .get(1)
        .ok_or("You should specify a config file and a trace file")?;
    let trace_path = param_tokens
        .get(2)
        .ok_or("You should specify a config file and a trace file")?;

    // L2 stays as configured, only L1 varies
    let config = HierarchyConfig::from_path(Path::new(config_path))?;
    let operations = fetch_operations(Path::new(trace_path))?;

    // L1 sizes: 1KB, 2KB, 4KB, 8KB, 16KB, 32KB
    let l1_sizes = vec![1, 2, 4, 8, 16, 32];
    // Associativities: direct mapped, 2-way, 4-way, fully associative
    let associativities = vec![1, 2, 4, 0];

    let trace_base_name = Path::new(trace_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| trace_path.clone());
    std::fs::create_dir_all("eval")?;
    let csv_path = format!("eval/sweep_{}.csv", trace_base_name);
    let mut writer = csv::Writer::from_path(&csv_path)?;
    writer.write_record([
        "L1 size (KB)",
        "L1 associativity",
        "L1 miss rate",
        "L2 miss rate",
        "Memory writes",
    ])?;

    // One line series per associativity: (L1 size, L1 miss rate)
    let mut data: Vec<Vec<(u32, f64)>> = vec![vec![]; associativities.len()];
    for (i, associativity) in associativities.iter().enumerate() {
        for l1_size in l1_sizes.iter() {
            let l1 = match Geometry::make(
                config.l1.block_size,
                *associativity,
                *l1_size,
            ) {
                Ok(l1) => l1,
                Err(e) => {
                    warn!("Skipping L1 of {} KB: {}", l1_size, e);
                    continue;
                }
            };
            let mut hierarchy = InclusiveHierarchy::make(l1, config.l2)?;
            run_trace(&mut hierarchy, &operations);
            hierarchy.verify_inclusion()?;

            let summary = RunSummary::of(&hierarchy, operations.len());
            let l1_miss_rate = summary.l1.get_miss_rate();
            writer.write_record([
                &l1_size.to_string(),
                &associativity.to_string(),
                &format!("{:.4}", l1_miss_rate),
                &format!("{:.4}", summary.l2.get_miss_rate()),
                &summary.memory_writes.to_string(),
            ])?;
            data[i].push((*l1_size, l1_miss_rate));
        }
    }
    writer.flush()?;

    // Plot the data
    let plot_title = format!("L1 miss rate: {}", trace_base_name);
    let output_path = format!("eval/sweep_{}.svg", trace_base_name);

    let root = SVGBackend::new(output_path.as_str(), (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(plot_title.as_str(), ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(1u32..32u32, 0.0..1.0)?;
    ctx.configure_mesh()
        .x_desc("L1 size (KB)")
        .y_desc("Miss rate")
        .draw()?;

    for (i, associativity) in associativities.iter().enumerate() {
        let label = match associativity {
            0 => String::from("Fully associative"),
            n => format!("{}-way", n),
        };
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(data[i].iter().copied(), color))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color)
            });
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(())
}

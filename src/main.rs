use imageset_builder::config::{load_config, Config, RunMode, SizeMode};
use imageset_builder::dataset::DatasetBuilder;
use imageset_builder::error::Result;
use imageset_builder::store::RecordStore;
use std::env;
use std::fs::File;

// Main application
fn main() -> Result<()> {
    // Get command line arguments
    let args: Vec<String> = env::args().collect();

    // If no arguments provided, run the default mode from config
    if args.len() <= 1 {
        return run_from_config();
    }

    // Handle different commands
    match args[1].as_str() {
        "refs" => {
            let mut config = load_config()?;
            init_logging(&config);

            // Override the dataset directory if provided
            if args.len() > 2 {
                config.dataset_directory = args[2].clone();
            }

            // Reference export always engages the store
            config.use_db = true;
            run_reference_export(&config)?;
        }
        "table" => {
            let mut config = load_config()?;
            init_logging(&config);

            if args.len() > 2 {
                config.dataset_directory = args[2].clone();
            }
            if args.len() > 3 {
                config.table_output = args[3].clone();
            }

            run_table_export(&config)?;
        }
        "tensor" => {
            let mut config = load_config()?;
            init_logging(&config);

            if args.len() > 2 {
                config.dataset_directory = args[2].clone();
            }

            run_tensor_export(&config)?;
        }
        "store" => {
            if args.len() < 3 {
                println!("Usage: imageset-builder store <command>");
                println!("Commands:");
                println!("  show - Print every stored record");
                println!("  drop - Delete the reference collection");
                return Ok(());
            }

            let config = load_config()?;
            init_logging(&config);

            match args[2].as_str() {
                "show" => show_store(&config)?,
                "drop" => drop_store(&config)?,
                _ => {
                    println!("Unknown store command: {}", args[2]);
                }
            }
        }
        "config" => {
            if args.len() < 3 {
                println!("Usage: imageset-builder config <command> [args]");
                println!("Commands:");
                println!("  create - Create default configuration file");
                println!("  show   - Show current configuration");
                println!("  check  - Check configuration settings");
                println!("  set <key> <value> - Modify a configuration setting");
                return Ok(());
            }

            match args[2].as_str() {
                "create" => create_config()?,
                "show" => show_config()?,
                "check" => check_config()?,
                "set" => {
                    if args.len() < 5 {
                        println!("Usage: imageset-builder config set <key> <value>");
                        return Ok(());
                    }
                    set_config(&args[3], &args[4])?;
                }
                _ => {
                    println!("Unknown config command: {}", args[2]);
                }
            }
        }
        "help" => {
            print_help();
        }
        _ => {
            println!("Unknown command: {}", args[1]);
            print_help();
        }
    }

    Ok(())
}

/// Run the appropriate mode based on configuration
fn run_from_config() -> Result<()> {
    let config = load_config()?;
    init_logging(&config);

    println!("Running mode from configuration: {:?}", config.run_mode);

    match config.run_mode {
        RunMode::ExportReferences => run_reference_export(&config),
        RunMode::ExportTable => run_table_export(&config),
        RunMode::ExportTensor => run_tensor_export(&config),
    }
}

fn init_logging(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(&config.log_level);
    // The builder may already be set up when called twice in tests
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Write every image path into the record store
fn run_reference_export(config: &Config) -> Result<()> {
    println!("Dataset folder: {}", config.dataset_directory);
    println!("Record store: {}", config.store_path);

    let mut builder = DatasetBuilder::new(config)?;
    builder.export_references_to_store()?;

    println!(
        "Exported {} references across {} classes",
        builder.catalog().total_images(),
        builder.catalog().len()
    );
    Ok(())
}

/// Build the path table and save it as CSV
fn run_table_export(config: &Config) -> Result<()> {
    println!("Dataset folder: {}", config.dataset_directory);

    let builder = DatasetBuilder::new(config)?;
    let table = builder.export_as_table();

    let output = config.get_table_output();
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(&output)?;
    table.write_csv(&mut file)?;

    println!(
        "Saved table with {} columns and {} rows to {}",
        table.num_columns(),
        table.num_rows(),
        output.display()
    );
    Ok(())
}

/// Build the feature/label matrices and report their shapes
fn run_tensor_export(config: &Config) -> Result<()> {
    println!("Dataset folder: {}", config.dataset_directory);

    let builder = DatasetBuilder::new(config)?;
    if let Some(dims) = builder.sample_dims() {
        println!(
            "Sample dimensions: {}x{}x{}",
            dims.height, dims.width, dims.depth
        );
    }

    let (features, labels) = builder.export_as_tensor()?;
    println!(
        "Features: {} rows x {} columns",
        features.nrows(),
        features.ncols()
    );
    println!(
        "Labels:   {} rows x {} columns",
        labels.nrows(),
        labels.ncols()
    );
    Ok(())
}

/// Print every record currently stored
fn show_store(config: &Config) -> Result<()> {
    let store = RecordStore::open(config.get_store_path(), false)?;
    for record in store.read_all() {
        println!(
            "Record {} ({} references, updated {})",
            record.id,
            record.images.len(),
            record.updated_at
        );
        for image in &record.images {
            println!("  {}", image);
        }
    }
    Ok(())
}

/// Delete the reference collection. No undo.
fn drop_store(config: &Config) -> Result<()> {
    let store = RecordStore::open(config.get_store_path(), false)?;
    store.drop_collection()?;
    println!("Dropped record store at {}", config.store_path);
    Ok(())
}

/// Create default configuration file
fn create_config() -> Result<()> {
    let config = Config::default();
    config.save_to_file("config.json")?;
    println!("Created default configuration file: config.json");
    Ok(())
}

/// Show current configuration
fn show_config() -> Result<()> {
    let config = load_config()?;
    println!("{:#?}", config);
    Ok(())
}

/// Check configuration settings
fn check_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration check:");
    println!("  Dataset directory: {}", config.dataset_directory);
    println!("  Record store: {}", config.store_path);
    println!("  Table output: {}", config.table_output);
    println!("  Images size: {:?}", config.images_size);
    println!("  Use store: {}", config.use_db);
    println!("  Sorted listing: {}", config.sort_entries);

    Ok(())
}

/// Set configuration setting
fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = load_config()?;

    // Update configuration based on key
    match key {
        "dataset_directory" => {
            config.dataset_directory = value.to_string();
        }
        "store_path" => {
            config.store_path = value.to_string();
        }
        "table_output" => {
            config.table_output = value.to_string();
        }
        "use_db" => {
            config.use_db = parse_bool(key, value)?;
        }
        "create_store" => {
            config.create_store = parse_bool(key, value)?;
        }
        "sort_entries" => {
            config.sort_entries = parse_bool(key, value)?;
        }
        "images_size" => {
            config.images_size = match value {
                "constant" => SizeMode::Constant,
                "variable" => SizeMode::Variable,
                _ => {
                    return Err(imageset_builder::Error::Validation(format!(
                        "images_size must be 'constant' or 'variable', got '{}'",
                        value
                    )))
                }
            };
        }
        _ => {
            return Err(imageset_builder::Error::Validation(format!(
                "Unknown configuration key: {}",
                key
            )));
        }
    }

    // Save updated configuration
    config.save_to_file("config.json")?;
    println!("Updated configuration saved");
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse::<bool>().map_err(|_| {
        imageset_builder::Error::Validation(format!(
            "{} must be 'true' or 'false', got '{}'",
            key, value
        ))
    })
}

/// Print help information
fn print_help() {
    println!("Imageset Builder - labeled image folders to dataset converter");
    println!();
    println!("Commands:");
    println!("  refs [dataset_dir]              - Write image path references to the record store");
    println!("  table [dataset_dir] [out_csv]   - Save the class/path table as CSV");
    println!("  tensor [dataset_dir]            - Build the feature and label matrices");
    println!("  store <show|drop>               - Inspect or delete the record store");
    println!("  config <subcommand>             - Manage configuration");
    println!("  help                            - Show this help message");
    println!();
    println!("Running without arguments:");
    println!("  The application will run according to the \"run_mode\" setting in config.json");
    println!();
    println!("Available run_mode values:");
    println!("  - export_references");
    println!("  - export_table");
    println!("  - export_tensor");
}

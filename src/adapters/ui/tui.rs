//! Implements InputPort. Inquire-based interactive session.
//!
//! Main menu -> DCF / Comparables / VC Method / Sensitivity / edit inputs / export / refresh.
//! Calculator errors are shown and the session continues.

use crate::adapters::export::CsvExporter;
use crate::adapters::ui::{progress, render};
use crate::domain::limits::{
    DILUTION_RANGE, DISCOUNT_RATE_RANGE, EXIT_MULTIPLE_RANGE, GROWTH_RANGE, InputRange,
    MARGIN_RANGE, REVENUE_RANGE, TARGET_MULTIPLE_RANGE, TERMINAL_GROWTH_RANGE,
    YEARS_TO_EXIT_RANGE,
};
use crate::domain::{
    ClinicalStage, DomainError, PROJECTION_YEARS, RevenueModel, ValuationInputs, VcMethodInputs,
    dcf, sensitivity, vc_method,
};
use crate::ports::InputPort;
use crate::usecases::ValuationService;
use async_trait::async_trait;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, InquireError, Select, Text};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Applies the prompt theme globally. Call once before the first prompt.
pub fn apply_theme() {
    let config = RenderConfig::default_colored()
        .with_prompt_prefix(Styled::new("✚").with_fg(Color::LightCyan))
        .with_highlighted_option_prefix(Styled::new("➤").with_fg(Color::LightCyan));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Dcf,
    Comparables,
    VcMethod,
    Sensitivity,
    EditInputs,
    Export,
    RefreshMarketData,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 8] = [
        MenuItem::Dcf,
        MenuItem::Comparables,
        MenuItem::VcMethod,
        MenuItem::Sensitivity,
        MenuItem::EditInputs,
        MenuItem::Export,
        MenuItem::RefreshMarketData,
        MenuItem::Quit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::Dcf => "📈 DCF Analysis",
            MenuItem::Comparables => "🏢 Comparable Companies",
            MenuItem::VcMethod => "🚀 VC Method",
            MenuItem::Sensitivity => "🔬 Sensitivity Analysis",
            MenuItem::EditInputs => "✏️  Edit startup parameters",
            MenuItem::Export => "💾 Export tables to CSV",
            MenuItem::RefreshMarketData => "🔄 Refresh market data",
            MenuItem::Quit => "Quit",
        };
        f.write_str(label)
    }
}

fn in_range(range: InputRange, v: f64) -> Validation {
    if range.contains(v) {
        Validation::Valid
    } else {
        Validation::Invalid(format!("Must be in {}", range).into())
    }
}

/// Numeric prompt with a default and a range check.
fn prompt_f64(message: &str, default: f64, range: InputRange) -> Result<f64, InquireError> {
    CustomType::<f64>::new(message)
        .with_default(default)
        .with_error_message("Please type a number (decimal fractions for percentages, e.g. 0.15)")
        .with_validator(move |v: &f64| Ok(in_range(range, *v)))
        .prompt()
}

fn prompt_years(default: u32) -> Result<u32, InquireError> {
    let (min, max) = YEARS_TO_EXIT_RANGE;
    CustomType::<u32>::new("Years to exit:")
        .with_default(default)
        .with_validator(move |v: &u32| {
            if (min..=max).contains(v) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Must be between {} and {}", min, max).into(),
                ))
            }
        })
        .prompt()
}

fn select_index<T: fmt::Display + Clone>(
    message: &str,
    options: &[T],
    current: usize,
) -> Result<T, InquireError> {
    Select::new(message, options.to_vec())
        .with_starting_cursor(current)
        .prompt()
}

/// Walks through every startup parameter, pre-filled with `current`.
fn prompt_inputs(current: &ValuationInputs) -> Result<ValuationInputs, InquireError> {
    let name = Text::new("Company name:")
        .with_default(&current.name)
        .prompt()?;
    let current_revenue = prompt_f64(
        "Current revenue ($M):",
        current.current_revenue,
        REVENUE_RANGE,
    )?;

    let mut revenue_growth_rates = current.revenue_growth_rates;
    for (i, rate) in revenue_growth_rates.iter_mut().enumerate() {
        *rate = prompt_f64(&format!("Year {} revenue growth:", i + 1), *rate, GROWTH_RANGE)?;
    }

    let ebitda_margin = prompt_f64("EBITDA margin:", current.ebitda_margin, MARGIN_RANGE)?;
    let discount_rate = prompt_f64(
        "Discount rate (WACC):",
        current.discount_rate,
        DISCOUNT_RATE_RANGE,
    )?;
    let terminal_growth_rate = CustomType::<f64>::new("Terminal growth rate:")
        .with_default(current.terminal_growth_rate.min(discount_rate - 0.01))
        .with_validator(move |v: &f64| {
            Ok(match in_range(TERMINAL_GROWTH_RANGE, *v) {
                Validation::Valid if *v >= discount_rate => Validation::Invalid(
                    format!("Must be below the discount rate ({})", discount_rate).into(),
                ),
                other => other,
            })
        })
        .prompt()?;

    let stage_pos = ClinicalStage::ALL
        .iter()
        .position(|s| *s == current.clinical_stage)
        .unwrap_or(0);
    let clinical_stage = select_index(
        "Clinical/regulatory stage:",
        &ClinicalStage::ALL,
        stage_pos,
    )?;
    let model_pos = RevenueModel::ALL
        .iter()
        .position(|m| *m == current.revenue_model)
        .unwrap_or(0);
    let revenue_model = select_index("Revenue model:", &RevenueModel::ALL, model_pos)?;

    Ok(ValuationInputs {
        name,
        current_revenue,
        revenue_growth_rates,
        ebitda_margin,
        discount_rate,
        terminal_growth_rate,
        clinical_stage,
        revenue_model,
    })
}

fn prompt_vc_inputs(
    inputs: &ValuationInputs,
    current: &VcMethodInputs,
) -> Result<VcMethodInputs, InquireError> {
    let default_exit_revenue = current.exit_revenue.unwrap_or(100.0);
    let default_exit_multiple = if default_exit_revenue > 0.0 {
        current.exit_value / default_exit_revenue
    } else {
        8.0
    };
    let exit_revenue = prompt_f64(
        "Projected exit revenue ($M):",
        default_exit_revenue,
        REVENUE_RANGE,
    )?;
    let exit_multiple = prompt_f64(
        "Exit EV/Revenue multiple:",
        default_exit_multiple,
        EXIT_MULTIPLE_RANGE,
    )?;
    let target = prompt_f64(
        "Target return multiple:",
        current.target_return_multiple,
        TARGET_MULTIPLE_RANGE,
    )?;
    let years = prompt_years(current.years_to_exit)?;
    let dilution = prompt_f64(
        "Expected dilution before exit:",
        current.expected_dilution,
        DILUTION_RANGE,
    )?;
    Ok(VcMethodInputs::from_exit_revenue(
        inputs.current_revenue,
        exit_revenue,
        exit_multiple,
        target,
        years,
        dilution,
    ))
}

/// Start / end / steps for one sensitivity axis.
fn prompt_axis(
    label: &str,
    default: (f64, f64),
    range: InputRange,
) -> Result<Vec<f64>, InquireError> {
    let start = prompt_f64(&format!("{} from:", label), default.0, range)?;
    let end = prompt_f64(&format!("{} to:", label), default.1, range)?;
    let steps = CustomType::<usize>::new(&format!("{} steps:", label))
        .with_default(sensitivity::DEFAULT_STEPS)
        .with_validator(|v: &usize| {
            if (1..=15).contains(v) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Must be between 1 and 15".into()))
            }
        })
        .prompt()?;
    Ok(sensitivity::linspace(start, end, steps))
}

fn print_section(title: &str) {
    println!();
    println!("── {} ──", title);
}

fn print_error(e: &DomainError) {
    warn!(error = %e, "valuation failed");
    println!("⚠  {}", e);
}

/// TUI adapter. Inquire prompts over the valuation service.
pub struct TuiInputPort {
    service: Arc<ValuationService>,
    exporter: CsvExporter,
}

impl TuiInputPort {
    pub fn new(service: Arc<ValuationService>, exporter: CsvExporter) -> Self {
        Self { service, exporter }
    }

    fn show_dcf(&self, inputs: &ValuationInputs) {
        print_section(&format!("Discounted Cash Flow: {}", inputs.name));
        match self.service.dcf(inputs) {
            Ok((result, projections)) => {
                println!("{}", render::projections(&projections));
                println!("Revenue & FCF projections:");
                println!("{}", render::revenue_fcf_chart(&projections));
                println!("{}", render::valuation(&result));
                println!("Valuation bridge:");
                println!("{}", render::valuation_bridge(&result));
            }
            Err(e) => print_error(&e),
        }
    }

    async fn show_comparables(&self, inputs: &ValuationInputs) -> Result<(), InquireError> {
        let premium = Confirm::new("Adjust the peer multiple for relative growth?")
            .with_default(true)
            .prompt()?;
        print_section("Comparable Companies");
        let pb = progress::spinner("Fetching live market data...");
        let outcome = self.service.comparables(inputs, premium).await;
        pb.finish_and_clear();
        match outcome {
            Ok(run) => {
                println!("{}", render::comparables(&run));
                println!("EV/Revenue multiples:");
                println!("{}", render::multiples_chart(&run));
            }
            Err(e) => {
                print_error(&e);
                println!("   Market data may be temporarily unavailable; try again later.");
            }
        }
        Ok(())
    }

    fn show_vc(&self, vc: &VcMethodInputs) {
        print_section("VC Method");
        match self.service.vc(vc) {
            Ok(result) => {
                println!("{}", render::valuation(&result));
                if let (Some(current), Some(exit)) = (vc.current_revenue, vc.exit_revenue) {
                    println!("Revenue path to exit:");
                    println!(
                        "{}",
                        render::revenue_path(&vc_method::revenue_path(
                            current,
                            exit,
                            vc.years_to_exit
                        ))
                    );
                }
            }
            Err(e) => print_error(&e),
        }
    }

    fn show_sensitivity(&self, inputs: &ValuationInputs) -> Result<(), InquireError> {
        let defaults = Confirm::new("Use default ranges (WACC 10-20%, growth 2-5%)?")
            .with_default(true)
            .prompt()?;
        let grid = if defaults {
            self.service.sensitivity(inputs, None, None)
        } else {
            let rates = prompt_axis(
                "Discount rate",
                sensitivity::DEFAULT_DISCOUNT_RANGE,
                DISCOUNT_RATE_RANGE,
            )?;
            let growths = prompt_axis(
                "Terminal growth",
                sensitivity::DEFAULT_GROWTH_RANGE,
                TERMINAL_GROWTH_RANGE,
            )?;
            self.service
                .sensitivity(inputs, Some(&rates), Some(&growths))
        };

        print_section("Enterprise Value Sensitivity (WACC vs Terminal Growth)");
        println!("{}", render::sensitivity(&grid));
        if grid.undefined_count() > 0 {
            println!("n/a: discount rate must exceed terminal growth rate");
        }

        print_section("Clinical Stage Risk Impact");
        match self.service.stage_impact(inputs) {
            Ok(rows) => println!("{}", render::stage_impact(&rows)),
            Err(e) => print_error(&e),
        }
        Ok(())
    }

    async fn export(&self, inputs: &ValuationInputs) {
        let stages = match self.service.stage_impact(inputs) {
            Ok(rows) => rows,
            Err(e) => return print_error(&e),
        };
        let grid = self.service.sensitivity(inputs, None, None);
        let projections = dcf::project(inputs);
        match self
            .exporter
            .export(&inputs.name, &projections, &grid, &stages)
            .await
        {
            Ok(paths) => {
                for p in paths {
                    println!("✔ {}", p.display());
                }
            }
            Err(e) => print_error(&e),
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut inputs = ValuationInputs::default();
        let mut vc = VcMethodInputs::from_exit_revenue(
            inputs.current_revenue,
            100.0,
            8.0,
            5.0,
            5,
            0.0,
        );
        println!(
            "Loaded sample startup '{}' ({} years projected). Choose 'Edit startup parameters' to change it.",
            inputs.name, PROJECTION_YEARS
        );

        loop {
            let choice = match Select::new("What do you want to run?", MenuItem::ALL.to_vec())
                .prompt()
            {
                Ok(c) => c,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    break;
                }
                Err(e) => return Err(DomainError::Input(e.to_string())),
            };

            let step = match choice {
                MenuItem::Dcf => {
                    self.show_dcf(&inputs);
                    Ok(())
                }
                MenuItem::Comparables => self.show_comparables(&inputs).await,
                MenuItem::VcMethod => prompt_vc_inputs(&inputs, &vc).map(|new_vc| {
                    vc = new_vc;
                    self.show_vc(&vc);
                }),
                MenuItem::Sensitivity => self.show_sensitivity(&inputs),
                MenuItem::EditInputs => prompt_inputs(&inputs).map(|new_inputs| {
                    info!(
                        name = %new_inputs.name,
                        stage = %new_inputs.clinical_stage,
                        "inputs updated"
                    );
                    vc.current_revenue = Some(new_inputs.current_revenue);
                    inputs = new_inputs;
                }),
                MenuItem::Export => {
                    self.export(&inputs).await;
                    Ok(())
                }
                MenuItem::RefreshMarketData => {
                    let dropped = self.service.refresh_market_data().await;
                    println!(
                        "✔ Cleared {} cached quote(s); the next comparables run fetches fresh data.",
                        dropped
                    );
                    Ok(())
                }
                MenuItem::Quit => break,
            };

            match step {
                Ok(()) => {}
                Err(InquireError::OperationCanceled) => println!("(cancelled)"),
                Err(InquireError::OperationInterrupted) => break,
                Err(e) => return Err(DomainError::Input(e.to_string())),
            }
        }
        Ok(())
    }
}

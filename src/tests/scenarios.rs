use super::fake::*;
use crate::error::Divergence;
use crate::network::NetworkModel;
use crate::newton::NewtonSolver;
use crate::opt::{PFOpt, StressOpt};
use crate::stress::{CapacityStressTester, ResultLog, SearchState};
use crate::traits::{ElectricalState, PowerFlowSolver};
use anyhow::{format_err, Result};

fn run(solver: &dyn PowerFlowSolver) -> Result<(ResultLog, SearchState)> {
    let mut net = NetworkModel::construct()?;
    let tester = CapacityStressTester::new(&mut net, solver, StressOpt::default())?;
    Ok(tester.run()?)
}

#[test]
fn test_first_step_at_no_load() -> Result<()> {
    let mut net = NetworkModel::construct()?;
    let solver = |_: &NetworkModel| -> Result<ElectricalState, Divergence> {
        Ok(ElectricalState::new(0.1, 1.0))
    };
    let mut tester = CapacityStressTester::new(&mut net, &solver, StressOpt::default())?;
    assert_eq!(tester.current_load_mw(), 0.0);

    assert_eq!(tester.step()?, SearchState::Searching);
    assert_eq!(tester.log().len(), 1);
    let record = tester.log().records()[0];
    assert_eq!(record.load_kw, 0.0);
    assert_eq!(record.transformer_loading_pct, 0.1);
    assert_eq!(record.bus_voltage_pu, 1.0);
    assert_eq!(tester.current_load_mw(), 0.02);
    Ok(())
}

#[test]
fn test_overload_at_3_mw() -> Result<()> {
    let solver = trips_at(150, 20.0, ElectricalState::new(99.0, 0.97));
    let (log, state) = run(&solver)?;

    assert_eq!(state, SearchState::StoppedAtOverload);
    assert_eq!(log.len(), 151);
    let last = log.last().ok_or_else(|| format_err!("log must not be empty"))?;
    assert_eq!(last.load_kw, 3000.0);
    assert_eq!(last.transformer_loading_pct, 99.0);
    assert_eq!(log.max_safe_load_kw(state), Some(2980.0));
    Ok(())
}

#[test]
fn test_undervoltage_at_1_5_mw() -> Result<()> {
    let solver = trips_at(75, 20.0, ElectricalState::new(80.0, 0.94));
    let (log, state) = run(&solver)?;

    assert_eq!(state, SearchState::StoppedAtUndervoltage);
    assert_eq!(log.len(), 76);
    let last = log.last().ok_or_else(|| format_err!("log must not be empty"))?;
    assert_eq!(last.load_kw, 1500.0);
    assert_eq!(last.bus_voltage_pu, 0.94);
    Ok(())
}

#[test]
fn test_divergence_at_4_mw() -> Result<()> {
    let solver = diverges_at(200, 20.0);
    let (log, state) = run(&solver)?;

    assert_eq!(state, SearchState::StoppedAtDivergence);
    // no record for the diverged step
    assert_eq!(log.len(), 200);
    let last = log.last().ok_or_else(|| format_err!("log must not be empty"))?;
    assert_eq!(last.load_kw, 3980.0);
    assert_eq!(log.max_safe_load_kw(state), Some(3980.0));
    Ok(())
}

#[test]
fn test_divergence_at_no_load() -> Result<()> {
    let (log, state) = run(&diverges_at(0, 20.0))?;
    assert_eq!(state, SearchState::StoppedAtDivergence);
    assert!(log.is_empty());
    assert_eq!(log.max_safe_load_kw(state), None);
    Ok(())
}

#[test]
fn test_simulation_ceiling() -> Result<()> {
    let (log, state) = run(&healthy)?;

    assert_eq!(state, SearchState::StoppedAtSimulationCeiling);
    assert_eq!(log.len(), 251);
    let last = log.last().ok_or_else(|| format_err!("log must not be empty"))?;
    assert_eq!(last.load_kw, 5000.0);
    Ok(())
}

#[test]
fn test_thermal_checked_before_voltage() -> Result<()> {
    let (log, state) = run(&two_limits(100, 100, 20.0))?;
    assert_eq!(state, SearchState::StoppedAtOverload);
    assert_eq!(log.len(), 101);

    let (_, state) = run(&two_limits(101, 100, 20.0))?;
    assert_eq!(state, SearchState::StoppedAtUndervoltage);
    Ok(())
}

#[test]
fn test_limits_are_inclusive() -> Result<()> {
    let (_, state) = run(&trips_at(10, 20.0, ElectricalState::new(98.0, 0.99)))?;
    assert_eq!(state, SearchState::StoppedAtOverload);

    let (_, state) = run(&trips_at(10, 20.0, ElectricalState::new(50.0, 0.95)))?;
    assert_eq!(state, SearchState::StoppedAtUndervoltage);
    Ok(())
}

#[test]
fn test_repeated_solve_is_identical() -> Result<()> {
    let mut net = NetworkModel::construct()?;
    net.set_load(0.74)?;
    assert_eq!(net.solve(&healthy)?, net.solve(&healthy)?);
    Ok(())
}

#[test]
fn test_data_center_branch() -> Result<()> {
    let solver = NewtonSolver::new(PFOpt::default());
    let (log, state) = run(&solver)?;

    // the 50 m busway drops voltage before the transformer overheats
    assert_eq!(state, SearchState::StoppedAtUndervoltage);
    let last = log.last().ok_or_else(|| format_err!("log must not be empty"))?;
    if !(1600.0..=1900.0).contains(&last.load_kw) {
        return Err(format_err!("unexpected breaking load {} kW", last.load_kw));
    }
    assert!(last.bus_voltage_pu <= 0.95);
    assert!(last.transformer_loading_pct < 98.0);

    let first = log.records()[0];
    assert!((first.bus_voltage_pu - 1.0).abs() < 1e-3);
    for w in log.records().windows(2) {
        assert_eq!(w[1].load_kw - w[0].load_kw, 20.0);
        assert!(w[1].bus_voltage_pu < w[0].bus_voltage_pu);
        assert!(w[1].transformer_loading_pct > w[0].transformer_loading_pct);
    }
    Ok(())
}

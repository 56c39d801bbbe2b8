use cv_engine::reference::PlfEngine;
use cv_viz::{PlotCommand, RecordingLabels, RecordingPlot, VizConfig, Visualizer};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn slider_keeps_position_in_range_and_scope_fixed(
        moves in prop::collection::vec(-20.0f64..20.0, 1..20)
    ) {
        let mut viz = Visualizer::new(
            PlfEngine::new(),
            RecordingPlot::new(),
            RecordingLabels::new(),
            VizConfig::default(),
        )
        .unwrap();
        viz.plot_mut().take_commands();
        let live = viz.engine().live_objects();
        let (lo, hi) = viz.state().profile().unwrap().position_range();

        for x in &moves {
            viz.on_position_changed(*x).unwrap();
            let position = viz.state().position();
            prop_assert!(lo <= position && position <= hi);
            prop_assert_eq!(
                viz.state().position_label().len(),
                viz.state().label_padding()
            );
        }

        let commands = viz.plot_mut().take_commands();
        prop_assert_eq!(commands.len(), moves.len());
        for command in &commands {
            let is_position_restyle = matches!(
                command,
                PlotCommand::Restyle { indices, .. } if indices == &vec![1, 3, 4, 6]
            );
            prop_assert!(is_position_restyle);
        }
        prop_assert_eq!(viz.engine().live_objects(), live);
    }
}

mod exam_vm;

pub use exam_vm::{
    OptionVm, ProgressVm, QuestionVm, ResultVm, TestTypeCardVm, map_current_question,
    map_progress, map_test_type_cards,
};

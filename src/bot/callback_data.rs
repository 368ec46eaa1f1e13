//! Typed callback data for inline keyboards.
//!
//! Telegram limits callback data to 64 bytes, so actions are encoded as a
//! short verb followed by `:`-separated arguments.

use crate::models::{AttendanceStatus, HomeworkStatus, MasteryLevel};
use crate::schedule::weekday_from_index;

/// Grade filter of the library; `None` shows every grade
pub type GradeFilter = Option<i64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    MainMenu,
    Cancel,

    // Student
    LessonHistory,
    Schedule,
    HomeworkList,
    Payments,
    Progress,
    ChatWithTutor,
    LessonInfo(i64),
    ViewHomework(i64),
    SubmitHomework(i64),
    FinishSubmission(i64),

    // Shared library
    Library(GradeFilter),

    // Parent
    SelectChild,
    Child(i64),
    ChildProgress(i64),
    ChildSchedule(i64),
    ChildPayments(i64),
    ChildHomework(i64),

    // Tutor: students
    Students,
    Student(i64),
    StudentLessons(i64),
    AddLesson(i64),
    WeeklySchedule(i64),
    ToggleScheduleDay(u8),
    ScheduleDaysDone,
    AddPayment(i64),
    RenameStudent(i64),
    LinkParent(i64),
    UnlinkParent(i64),
    DeleteStudent(i64),
    DeleteStudentConfirmed(i64),

    // Tutor: lessons
    Lesson(i64),
    AttendanceMenu(i64),
    SetAttendance(i64, AttendanceStatus),
    ConfirmCancellation(i64, AttendanceStatus),
    ToggleConducted(i64),
    MasteryMenu(i64),
    SetMastery(i64, MasteryLevel),
    EditTopic(i64),
    RescheduleLesson(i64),
    DeleteLesson(i64),
    DeleteLessonConfirmed(i64),

    // Tutor: homework
    AddHomework(i64),
    FinishHomework,
    LessonHomework(i64),
    ReviewHomework(i64),
    SetHomeworkStatus(i64, HomeworkStatus),
    DeleteHomework(i64),
    ReviewQueue,

    // Tutor: reports, library, messaging
    ReportStudent(i64),
    ReportMonth(i64, u32),
    Material(i64),
    AddMaterial(GradeFilter),
    DeleteMaterial(i64),
    BroadcastSend,
    BroadcastCancel,
    ReplyTo(i64),
}

fn encode_grade(grade: GradeFilter) -> String {
    grade.map_or_else(|| "all".to_string(), |g| g.to_string())
}

fn parse_grade(arg: &str) -> Option<GradeFilter> {
    if arg == "all" {
        return Some(None);
    }
    let grade: i64 = arg.parse().ok()?;
    (1..=11).contains(&grade).then_some(Some(grade))
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        use CallbackAction::*;

        match self {
            MainMenu => "menu".to_string(),
            Cancel => "cancel".to_string(),
            LessonHistory => "lessons".to_string(),
            Schedule => "sched".to_string(),
            HomeworkList => "hw".to_string(),
            Payments => "pay".to_string(),
            Progress => "prog".to_string(),
            ChatWithTutor => "chat".to_string(),
            LessonInfo(id) => format!("li:{id}"),
            ViewHomework(id) => format!("hwv:{id}"),
            SubmitHomework(id) => format!("hws:{id}"),
            FinishSubmission(id) => format!("hwf:{id}"),
            Library(grade) => format!("lib:{}", encode_grade(*grade)),
            SelectChild => "kids".to_string(),
            Child(id) => format!("kid:{id}"),
            ChildProgress(id) => format!("kidp:{id}"),
            ChildSchedule(id) => format!("kidsc:{id}"),
            ChildPayments(id) => format!("kidpay:{id}"),
            ChildHomework(id) => format!("kidhw:{id}"),
            Students => "st".to_string(),
            Student(id) => format!("st:{id}"),
            StudentLessons(id) => format!("stl:{id}"),
            AddLesson(id) => format!("al:{id}"),
            WeeklySchedule(id) => format!("ws:{id}"),
            ToggleScheduleDay(day) => format!("wsd:{day}"),
            ScheduleDaysDone => "wsok".to_string(),
            AddPayment(id) => format!("ap:{id}"),
            RenameStudent(id) => format!("rn:{id}"),
            LinkParent(id) => format!("lp:{id}"),
            UnlinkParent(id) => format!("up:{id}"),
            DeleteStudent(id) => format!("ds:{id}"),
            DeleteStudentConfirmed(id) => format!("dsy:{id}"),
            Lesson(id) => format!("l:{id}"),
            AttendanceMenu(id) => format!("am:{id}"),
            SetAttendance(id, status) => format!("sa:{id}:{}", status.as_str()),
            ConfirmCancellation(id, status) => format!("ca:{id}:{}", status.as_str()),
            ToggleConducted(id) => format!("tc:{id}"),
            MasteryMenu(id) => format!("mm:{id}"),
            SetMastery(id, level) => format!("sm:{id}:{}", level.as_str()),
            EditTopic(id) => format!("et:{id}"),
            RescheduleLesson(id) => format!("rs:{id}"),
            DeleteLesson(id) => format!("dl:{id}"),
            DeleteLessonConfirmed(id) => format!("dly:{id}"),
            AddHomework(id) => format!("ah:{id}"),
            FinishHomework => "ahok".to_string(),
            LessonHomework(id) => format!("lh:{id}"),
            ReviewHomework(id) => format!("rh:{id}"),
            SetHomeworkStatus(id, status) => format!("hs:{id}:{}", status.as_str()),
            DeleteHomework(id) => format!("dhw:{id}"),
            ReviewQueue => "rq".to_string(),
            ReportStudent(id) => format!("rp:{id}"),
            ReportMonth(id, offset) => format!("rpm:{id}:{offset}"),
            Material(id) => format!("mat:{id}"),
            AddMaterial(grade) => format!("amat:{}", encode_grade(*grade)),
            DeleteMaterial(id) => format!("dmat:{id}"),
            BroadcastSend => "bcs".to_string(),
            BroadcastCancel => "bcc".to_string(),
            ReplyTo(telegram_id) => format!("re:{telegram_id}"),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        use CallbackAction::*;

        let mut parts = data.split(':');
        let verb = parts.next()?;
        let first = parts.next();
        let second = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let id = || -> Option<i64> { first?.parse().ok() };

        let action = match (verb, first, second) {
            ("menu", None, None) => MainMenu,
            ("cancel", None, None) => Cancel,
            ("lessons", None, None) => LessonHistory,
            ("sched", None, None) => Schedule,
            ("hw", None, None) => HomeworkList,
            ("pay", None, None) => Payments,
            ("prog", None, None) => Progress,
            ("chat", None, None) => ChatWithTutor,
            ("kids", None, None) => SelectChild,
            ("st", None, None) => Students,
            ("wsok", None, None) => ScheduleDaysDone,
            ("ahok", None, None) => FinishHomework,
            ("rq", None, None) => ReviewQueue,
            ("bcs", None, None) => BroadcastSend,
            ("bcc", None, None) => BroadcastCancel,

            ("lib", Some(grade), None) => Library(parse_grade(grade)?),
            ("amat", Some(grade), None) => AddMaterial(parse_grade(grade)?),
            ("wsd", Some(day), None) => {
                let day: u8 = day.parse().ok()?;
                weekday_from_index(day)?;
                ToggleScheduleDay(day)
            }

            ("sa", Some(_), Some(status)) => SetAttendance(id()?, status.parse().ok()?),
            ("ca", Some(_), Some(status)) => ConfirmCancellation(id()?, status.parse().ok()?),
            ("sm", Some(_), Some(level)) => SetMastery(id()?, level.parse().ok()?),
            ("hs", Some(_), Some(status)) => SetHomeworkStatus(id()?, status.parse().ok()?),
            ("rpm", Some(_), Some(offset)) => {
                let offset: u32 = offset.parse().ok()?;
                if offset > 2 {
                    return None;
                }
                ReportMonth(id()?, offset)
            }

            (verb, Some(_), None) => {
                let id = id()?;
                match verb {
                    "li" => LessonInfo(id),
                    "hwv" => ViewHomework(id),
                    "hws" => SubmitHomework(id),
                    "hwf" => FinishSubmission(id),
                    "kid" => Child(id),
                    "kidp" => ChildProgress(id),
                    "kidsc" => ChildSchedule(id),
                    "kidpay" => ChildPayments(id),
                    "kidhw" => ChildHomework(id),
                    "st" => Student(id),
                    "stl" => StudentLessons(id),
                    "al" => AddLesson(id),
                    "ws" => WeeklySchedule(id),
                    "ap" => AddPayment(id),
                    "rn" => RenameStudent(id),
                    "lp" => LinkParent(id),
                    "up" => UnlinkParent(id),
                    "ds" => DeleteStudent(id),
                    "dsy" => DeleteStudentConfirmed(id),
                    "l" => Lesson(id),
                    "am" => AttendanceMenu(id),
                    "tc" => ToggleConducted(id),
                    "mm" => MasteryMenu(id),
                    "et" => EditTopic(id),
                    "rs" => RescheduleLesson(id),
                    "dl" => DeleteLesson(id),
                    "dly" => DeleteLessonConfirmed(id),
                    "ah" => AddHomework(id),
                    "lh" => LessonHomework(id),
                    "rh" => ReviewHomework(id),
                    "dhw" => DeleteHomework(id),
                    "rp" => ReportStudent(id),
                    "mat" => Material(id),
                    "dmat" => DeleteMaterial(id),
                    "re" => ReplyTo(id),
                    _ => return None,
                }
            }

            _ => return None,
        };

        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!(CallbackAction::parse("menu"), Some(CallbackAction::MainMenu));
        assert_eq!(CallbackAction::parse("st:12"), Some(CallbackAction::Student(12)));
        assert_eq!(CallbackAction::parse("st"), Some(CallbackAction::Students));
        assert_eq!(
            CallbackAction::parse("sa:5:excused_absence"),
            Some(CallbackAction::SetAttendance(5, AttendanceStatus::ExcusedAbsence))
        );
        assert_eq!(CallbackAction::parse("lib:all"), Some(CallbackAction::Library(None)));
        assert_eq!(CallbackAction::parse("lib:7"), Some(CallbackAction::Library(Some(7))));
        assert_eq!(CallbackAction::parse("re:123456789"), Some(CallbackAction::ReplyTo(123456789)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("st:abc"), None);
        assert_eq!(CallbackAction::parse("sa:5:present"), None);
        assert_eq!(CallbackAction::parse("lib:12"), None);
        assert_eq!(CallbackAction::parse("rpm:3:5"), None);
        assert_eq!(CallbackAction::parse("wsd:9"), None);
        assert_eq!(CallbackAction::parse("menu:1"), None);
        assert_eq!(CallbackAction::parse("l:1:2:3"), None);
    }

    #[test]
    fn test_encoded_actions_parse_back() {
        let actions = [
            CallbackAction::ConfirmCancellation(42, AttendanceStatus::Rescheduled),
            CallbackAction::SetMastery(1, MasteryLevel::Mastered),
            CallbackAction::SetHomeworkStatus(9, HomeworkStatus::Checked),
            CallbackAction::ReportMonth(3, 2),
            CallbackAction::AddMaterial(None),
            CallbackAction::ToggleScheduleDay(6),
            CallbackAction::ChildSchedule(8),
        ];
        for action in actions {
            let data = action.encode();
            assert!(data.len() <= 64, "{data} exceeds Telegram limit");
            assert_eq!(CallbackAction::parse(&data), Some(action));
        }
    }
}

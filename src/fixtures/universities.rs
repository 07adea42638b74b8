use super::{Department, Institute, University};

pub fn universities() -> Vec<University> {
	vec![
		university(
			1,
			"Московский технический университет",
			vec![
				institute(
					1,
					"Институт информационных технологий",
					vec![
						department(1, "Кафедра Информатики", Some("Иванов И.И."), Some("+7-495-100-01-01")),
						department(2, "Кафедра Прикладной математики", Some("Петров П.П."), Some("+7-495-100-01-02")),
						department(3, "Кафедра Вычислительной техники", Some("Сидоров С.С."), Some("+7-495-100-01-03")),
					],
				),
				institute(
					2,
					"Институт кибербезопасности",
					vec![
						department(4, "Кафедра Защиты информации", Some("Кузнецова А.В."), Some("+7-495-100-02-01")),
						department(5, "Кафедра Криптографии", Some("Смирнов Д.А."), Some("+7-495-100-02-02")),
					],
				),
			],
		),
		university(
			2,
			"Санкт-Петербургский политехнический университет",
			vec![
				institute(
					3,
					"Институт машиностроения",
					vec![
						department(6, "Кафедра Технологии машиностроения", Some("Волков Е.Н."), Some("+7-812-200-03-01")),
						department(7, "Кафедра Мехатроники", Some("Морозова О.Л."), Some("+7-812-200-03-02")),
					],
				),
				institute(4, "Институт энергетики", Vec::new()),
				institute(
					5,
					"Гуманитарный институт",
					vec![department(8, "Кафедра Лингвистики", Some("Соколова Т.Г."), None)],
				),
			],
		),
		university(
			3,
			"Новосибирский государственный университет",
			vec![
				institute(
					6,
					"Физический институт",
					vec![
						department(9, "Кафедра Общей физики", Some("Лебедев В.М."), Some("+7-383-300-06-01")),
						department(10, "Кафедра Квантовой оптики", Some("Новикова Е.С."), Some("+7-383-300-06-02")),
					],
				),
				institute(
					7,
					"Институт математики",
					vec![department(11, "Кафедра Алгебры", Some("Федоров А.К."), Some("+7-383-300-07-01"))],
				),
			],
		),
		university(
			4,
			"Казанский федеральный университет",
			vec![institute(
				8,
				"Институт экономики",
				vec![
					department(12, "Кафедра Финансов", Some("Галиев Р.Р."), Some("+7-843-400-08-01")),
					department(13, "Кафедра Менеджмента", None, None),
				],
			)],
		),
		university(
			5,
			"Уральский федеральный университет",
			vec![
				institute(9, "Институт строительства", Vec::new()),
				institute(
					10,
					"Химико-технологический институт",
					vec![department(14, "Кафедра Органической химии", None, Some("+7-343-500-10-01"))],
				),
			],
		),
		university(6, "Томский государственный университет", Vec::new()),
		university(7, "Дальневосточный федеральный университет", Vec::new()),
		university(8, "Южный федеральный университет", Vec::new()),
		university(9, "Самарский университет", Vec::new()),
		university(10, "Воронежский государственный университет", Vec::new()),
	]
}

fn university(university_id: i64, name: &str, institutes: Vec<Institute>) -> University {
	University {
		university_id,
		name: name.to_string(),
		institutes,
	}
}

fn institute(institute_id: i64, name: &str, departments: Vec<Department>) -> Institute {
	Institute {
		institute_id,
		name: name.to_string(),
		departments,
	}
}

fn department(department_id: i64, name: &str, head: Option<&str>, phone: Option<&str>) -> Department {
	Department {
		department_id,
		name: name.to_string(),
		head: head.map(str::to_string),
		phone: phone.map(str::to_string),
	}
}

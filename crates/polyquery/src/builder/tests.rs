use super::*;
use crate::condition::{Condition, Operand};
use crate::error::QueryError;
use crate::expression::Expression;
use crate::lookup::Lookup;
use crate::query::Order;
use crate::schema::{ColumnSchema, ColumnType, SchemaRegistry, TableSchema};

fn qb(kind: DialectKind) -> QueryBuilder<'static> {
    QueryBuilder::for_kind(kind)
}

fn build(kind: DialectKind, query: &Query) -> Built {
    qb(kind).build(query).unwrap()
}

fn where_sql(kind: DialectKind, condition: Condition) -> String {
    build(kind, &Query::new().from("t").where_(condition)).sql
}

fn names(built: &Built) -> Vec<String> {
    built
        .params
        .as_ref()
        .map(|p| p.names().map(str::to_string).collect())
        .unwrap_or_default()
}

fn param(built: &Built, name: &str) -> Value {
    built
        .params
        .as_ref()
        .and_then(|p| p.get(name))
        .cloned()
        .unwrap_or_else(|| panic!("no param {name} in {built:?}"))
}

// ==================== Hash conditions ====================

#[test]
fn hash_list_binds_in_order() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .select("id")
            .from("t")
            .where_(Condition::hash([("field", vec![1, 2])])),
    );
    assert_eq!(built.sql, "SELECT `id` FROM `t` WHERE `field` IN (:field1, :field2)");
    assert_eq!(names(&built), [":field1", ":field2"]);
    assert_eq!(param(&built, ":field1"), Value::Int(1));
    assert_eq!(param(&built, ":field2"), Value::Int(2));
}

#[test]
fn hash_null_binds_nothing() {
    let built = build(
        DialectKind::Mysql,
        &Query::new().from("t").where_(Condition::hash([("field", Value::Null)])),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `field` IS NULL");
    assert!(built.params.is_none());
}

#[test]
fn hash_pairs_join_with_and() {
    assert_eq!(
        where_sql(
            DialectKind::Pgsql,
            Condition::hash([("a", Value::Int(1)), ("b", Value::Text("x".into()))])
        ),
        r#"SELECT * FROM "t" WHERE "a"=:a1 AND "b"=:b2"#
    );
}

#[test]
fn placeholder_names_strip_punctuation() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("user.first-name", "Al")])),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `user`.`first-name`=:userfirstname1");
}

#[test]
fn placeholders_never_overwrite_caller_params() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("a", 5)]))
            .bind("a1", 99),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `a`=:a2");
    assert_eq!(param(&built, ":a1"), Value::Int(99));
    assert_eq!(param(&built, ":a2"), Value::Int(5));
}

#[test]
fn raw_condition_names_are_reserved() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("a", 5)]))
            .and_where(Condition::raw_with_params("b = :a1", Params::new().with("a1", 99))),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `a`=:a2 AND (b = :a1)");
    assert_eq!(param(&built, ":a1"), Value::Int(99));
    assert_eq!(param(&built, ":a2"), Value::Int(5));
}

#[test]
fn expression_names_are_reserved() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("a", 5)]))
            .order_by_expr(Expression::new("FIELD(`b`, :a1)").bind("a1", 3)),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `a`=:a2 ORDER BY FIELD(`b`, :a1)");
    assert_eq!(param(&built, ":a1"), Value::Int(3));
    assert_eq!(param(&built, ":a2"), Value::Int(5));
}

#[test]
fn sub_query_names_are_reserved() {
    let sub = Query::new()
        .select("id")
        .from("s")
        .where_(Condition::raw("x = :a1"))
        .bind("a1", 99);
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("a", 5)]))
            .and_where(Condition::in_query("id", sub)),
    );
    assert_eq!(
        built.sql,
        "SELECT * FROM `t` WHERE `a`=:a2 AND `id` IN (SELECT `id` FROM `s` WHERE x = :a1)"
    );
    assert_eq!(param(&built, ":a1"), Value::Int(99));
    assert_eq!(param(&built, ":a2"), Value::Int(5));
}

#[test]
fn dml_reserves_condition_names() {
    let filter = Condition::raw_with_params("b = :a1", Params::new().with("a1", 99));
    let built = qb(DialectKind::Sqlite)
        .update("t", &[("a", 5.into())], Some(&filter))
        .unwrap();
    assert_eq!(built.sql, "UPDATE `t` SET `a`=:a2 WHERE b = :a1");
    assert_eq!(param(&built, ":a1"), Value::Int(99));
    assert_eq!(param(&built, ":a2"), Value::Int(5));

    let built = qb(DialectKind::Sqlite)
        .condition(&filter.and_with(Condition::eq("a", 1)))
        .unwrap();
    assert_eq!(built.sql, "(b = :a1) AND `a` = :a2");
}

#[test]
fn building_twice_is_identical() {
    let query = Query::new()
        .select("id")
        .from("t")
        .where_(Condition::hash([("a", vec![1, 2])]))
        .and_where(Condition::gt("b", 3))
        .limit(5);
    let builder = qb(DialectKind::Pgsql);
    assert_eq!(builder.build(&query).unwrap(), builder.build(&query).unwrap());
}

// ==================== IN ====================

#[test]
fn in_list_edge_cases() {
    let k = DialectKind::Mysql;
    assert_eq!(
        where_sql(k, Condition::in_list("a", Vec::<i64>::new())),
        "SELECT * FROM `t` WHERE 1=0"
    );
    assert_eq!(
        where_sql(k, Condition::not_in("a", Vec::<i64>::new())),
        "SELECT * FROM `t`"
    );
    assert_eq!(where_sql(k, Condition::in_list("a", vec![5])), "SELECT * FROM `t` WHERE `a`=:a1");
    assert_eq!(where_sql(k, Condition::not_in("a", vec![5])), "SELECT * FROM `t` WHERE `a`<>:a1");
}

#[test]
fn in_list_with_null_member() {
    let k = DialectKind::Mysql;
    assert_eq!(
        where_sql(k, Condition::hash([("a", vec![Value::Int(1), Value::Null, Value::Int(2)])])),
        "SELECT * FROM `t` WHERE (`a` IN (:a1, :a2) OR `a` IS NULL)"
    );
    assert_eq!(
        where_sql(k, Condition::not_in("a", vec![Value::Int(1), Value::Null])),
        "SELECT * FROM `t` WHERE (`a`<>:a1 AND `a` IS NOT NULL)"
    );
    assert_eq!(
        where_sql(k, Condition::in_list("a", vec![Value::Null])),
        "SELECT * FROM `t` WHERE `a` IS NULL"
    );
}

#[test]
fn multi_column_in() {
    let cond = || {
        Condition::in_rows(
            vec!["a", "b"],
            vec![vec![1.into(), 2.into()], vec![3.into(), Value::Null]],
        )
    };
    assert_eq!(
        where_sql(DialectKind::Mysql, cond()),
        "SELECT * FROM `t` WHERE (`a`, `b`) IN ((:a1, :b2), (:a3, :b4))"
    );
    assert_eq!(
        where_sql(DialectKind::Sqlite, cond()),
        "SELECT * FROM `t` WHERE ((`a`=:a1 AND `b`=:b2) OR (`a`=:a3 AND `b` IS NULL))"
    );
    assert_eq!(
        where_sql(
            DialectKind::Mssql,
            Condition::in_rows(vec!["a", "b"], vec![vec![1.into(), 2.into()]])
        ),
        "SELECT * FROM [t] WHERE [a]=:a1 AND [b]=:b2"
    );

    let bad = Condition::in_rows(vec!["a", "b"], vec![vec![1.into()]]);
    let err = qb(DialectKind::Mysql)
        .build(&Query::new().from("t").where_(bad))
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn in_sub_query_shares_the_context() {
    let sub = Query::new()
        .select("uid")
        .from("orders")
        .where_(Condition::hash([("total", 10)]));
    let built = build(
        DialectKind::Pgsql,
        &Query::new()
            .from("users")
            .where_(Condition::hash([("active", 1)]).and_with(Condition::in_query("id", sub))),
    );
    assert_eq!(
        built.sql,
        r#"SELECT * FROM "users" WHERE "active"=:active1 AND "id" IN (SELECT "uid" FROM "orders" WHERE "total"=:total2)"#
    );
    assert_eq!(names(&built), [":active1", ":total2"]);
}

#[test]
fn row_in_fallback_groups_as_one_operand() {
    let rows = || -> Vec<Vec<Value>> {
        vec![vec![1.into(), 2.into()], vec![3.into(), 4.into()]]
    };
    let built = build(
        DialectKind::Sqlite,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("x", 1)]))
            .and_where(Condition::in_rows(vec!["a", "b"], rows())),
    );
    assert_eq!(
        built.sql,
        "SELECT * FROM `t` WHERE `x`=:x1 AND ((`a`=:a2 AND `b`=:b3) OR (`a`=:a4 AND `b`=:b5))"
    );

    let negated = Condition::In {
        columns: vec!["a".into(), "b".into()],
        values: InValues::Rows(rows()),
        negated: true,
    };
    assert_eq!(
        where_sql(DialectKind::Mssql, negated),
        "SELECT * FROM [t] WHERE NOT (([a]=:a1 AND [b]=:b2) OR ([a]=:a3 AND [b]=:b4))"
    );
}

// ==================== Groups ====================

#[test]
fn nested_groups_are_parenthesized() {
    let k = DialectKind::Mysql;
    assert_eq!(
        where_sql(
            k,
            Condition::and(vec![
                Condition::hash([("a", 1)]),
                Condition::or(vec![Condition::hash([("b", 2)]), Condition::hash([("c", 3)])]),
            ])
        ),
        "SELECT * FROM `t` WHERE `a`=:a1 AND (`b`=:b2 OR `c`=:c3)"
    );
    assert_eq!(
        where_sql(
            k,
            Condition::or(vec![Condition::hash([("a", 1), ("b", 2)]), Condition::raw("x > 1")])
        ),
        "SELECT * FROM `t` WHERE (`a`=:a1 AND `b`=:b2) OR (x > 1)"
    );
    assert_eq!(
        where_sql(k, Condition::not(Condition::hash([("a", 1)]))),
        "SELECT * FROM `t` WHERE NOT (`a`=:a1)"
    );
}

#[test]
fn empty_conditions_vanish() {
    let k = DialectKind::Mysql;
    assert_eq!(
        where_sql(k, Condition::and(vec![Condition::and(vec![]), Condition::hash([("a", 1)])])),
        "SELECT * FROM `t` WHERE `a`=:a1"
    );
    assert_eq!(where_sql(k, Condition::or(vec![])), "SELECT * FROM `t`");
    assert_eq!(
        where_sql(k, Condition::not(Condition::hash(Vec::<(&str, Value)>::new()))),
        "SELECT * FROM `t`"
    );
}

#[test]
fn and_where_then_or_where() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::hash([("a", 1)]))
            .and_where(Condition::hash([("b", 2)]))
            .or_where(Condition::hash([("c", 3)])),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE (`a`=:a1 AND `b`=:b2) OR `c`=:c3");
}

// ==================== Operators ====================

#[test]
fn between_uses_two_placeholders() {
    let built = build(
        DialectKind::Mysql,
        &Query::new().from("t").where_(Condition::between("age", 18, 65)),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `age` BETWEEN :age1 AND :age2");
    assert_eq!(names(&built), [":age1", ":age2"]);
    assert_eq!(
        where_sql(DialectKind::Mysql, Condition::not_between("age", 1, 2)),
        "SELECT * FROM `t` WHERE `age` NOT BETWEEN :age1 AND :age2"
    );
}

#[test]
fn comparisons() {
    let k = DialectKind::Mysql;
    assert_eq!(where_sql(k, Condition::gt("age", 18)), "SELECT * FROM `t` WHERE `age` > :age1");
    assert_eq!(where_sql(k, Condition::ne("age", 18)), "SELECT * FROM `t` WHERE `age` <> :age1");
    assert_eq!(where_sql(k, Condition::eq("a", Value::Null)), "SELECT * FROM `t` WHERE `a` = NULL");
    assert_eq!(
        where_sql(k, Condition::eq("updated", Expression::new("NOW()"))),
        "SELECT * FROM `t` WHERE `updated` = NOW()"
    );
    let err = qb(k)
        .build(&Query::new().from("t").where_(Condition::gt("a", vec![1, 2])))
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn like_family() {
    let built = build(
        DialectKind::Mysql,
        &Query::new().from("t").where_(Condition::like("name", "50%")),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `name` LIKE :name1");
    assert_eq!(param(&built, ":name1"), Value::Text(r"%50\%%".into()));

    assert_eq!(
        where_sql(DialectKind::Sqlite, Condition::like("name", "a")),
        r"SELECT * FROM `t` WHERE `name` LIKE :name1 ESCAPE '\'"
    );
    assert_eq!(
        where_sql(DialectKind::Mysql, Condition::or_like("name", vec!["a", "b"])),
        "SELECT * FROM `t` WHERE (`name` LIKE :name1 OR `name` LIKE :name2)"
    );
    assert_eq!(
        where_sql(DialectKind::Pgsql, Condition::not_ilike("name", "x")),
        r#"SELECT * FROM "t" WHERE "name" NOT ILIKE :name1"#
    );
    assert_eq!(
        where_sql(DialectKind::Mysql, Condition::ilike("name", "x")),
        "SELECT * FROM `t` WHERE `name` LIKE :name1"
    );
}

#[test]
fn like_raw_pattern_is_verbatim() {
    let built = build(
        DialectKind::Sqlite,
        &Query::new().from("t").where_(Condition::like("name", "a%").raw_pattern()),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE `name` LIKE :name1");
    assert_eq!(param(&built, ":name1"), Value::Text("a%".into()));
}

#[test]
fn like_rejects_null() {
    let err = qb(DialectKind::Mysql)
        .build(&Query::new().from("t").where_(Condition::like("name", Value::Null)))
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn exists_sub_query() {
    let sub = Query::new()
        .select("id")
        .from("orders")
        .where_(Condition::raw("orders.uid = users.id"));
    assert_eq!(
        where_sql(DialectKind::Mysql, Condition::exists(sub.clone())),
        "SELECT * FROM `t` WHERE EXISTS (SELECT `id` FROM `orders` WHERE orders.uid = users.id)"
    );
    assert_eq!(
        where_sql(DialectKind::Mysql, Condition::not_exists(sub)),
        "SELECT * FROM `t` WHERE NOT EXISTS (SELECT `id` FROM `orders` WHERE orders.uid = users.id)"
    );
}

#[test]
fn raw_condition_keeps_its_params() {
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from("t")
            .where_(Condition::raw_with_params("status = :s", Params::new().with("s", 1))),
    );
    assert_eq!(built.sql, "SELECT * FROM `t` WHERE status = :s");
    assert_eq!(param(&built, ":s"), Value::Int(1));
}

#[test]
fn json_condition() {
    let cond = Condition::from_json_str(
        r#"["and", {"status": 1}, [">", "age", 18], ["like", "name", "al"]]"#,
    )
    .unwrap();
    assert_eq!(
        where_sql(DialectKind::Mysql, cond),
        "SELECT * FROM `t` WHERE `status`=:status1 AND `age` > :age2 AND `name` LIKE :name3"
    );
    let cond = Condition::from_json_str(r#"["like", "name", "al", true]"#).unwrap();
    assert_eq!(
        where_sql(DialectKind::Pgsql, cond),
        r#"SELECT * FROM "t" WHERE "name" NOT LIKE :name1"#
    );
}

#[test]
fn json_object_keeps_key_order() {
    let cond = Condition::from_json_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
    assert_eq!(
        where_sql(DialectKind::Sqlite, cond),
        "SELECT * FROM `t` WHERE `zeta`=:zeta1 AND `alpha`=:alpha2"
    );
}

#[test]
fn lookups_in_conditions() {
    assert_eq!(
        where_sql(DialectKind::Pgsql, Condition::lookup_key("name__icontains", "ali").unwrap()),
        r#"SELECT * FROM "t" WHERE "name" ILIKE :name1"#
    );
    assert_eq!(
        where_sql(
            DialectKind::Mysql,
            Condition::lookup("id", Lookup::In, Query::new().select("uid").from("o"))
        ),
        "SELECT * FROM `t` WHERE `id` IN (SELECT `uid` FROM `o`)"
    );
    let err = qb(DialectKind::Sqlite)
        .build(
            &Query::new()
                .from("t")
                .where_(Condition::lookup_key("body__search", "x").unwrap()),
        )
        .unwrap_err();
    assert!(err.is_not_implemented());
}

// ==================== Booleans ====================

#[test]
fn booleans_bind_as_dialect_values() {
    let query = Query::new().from("t").where_(Condition::hash([("active", true)]));
    assert_eq!(param(&build(DialectKind::Mysql, &query), ":active1"), Value::Int(1));
    assert_eq!(param(&build(DialectKind::Sqlite, &query), ":active1"), Value::Int(1));
    assert_eq!(
        param(&build(DialectKind::Pgsql, &query), ":active1"),
        Value::Text("TRUE".into())
    );
}

#[test]
fn boolean_lists_bind_per_dialect() {
    let query = Query::new()
        .from("t")
        .where_(Condition::hash([("active", vec![true, false])]));
    for kind in DialectKind::ALL {
        let built = build(kind, &query);
        let active = kind.dialect().quote_column_name("active");
        assert!(
            built.sql.ends_with(&format!("{active} IN (:active1, :active2)")),
            "{kind}: {}",
            built.sql
        );
        let (on, off) = if kind == DialectKind::Pgsql {
            (Value::Text("TRUE".into()), Value::Text("FALSE".into()))
        } else {
            (Value::Int(1), Value::Int(0))
        };
        assert_eq!(param(&built, ":active1"), on, "{kind}");
        assert_eq!(param(&built, ":active2"), off, "{kind}");
    }

    let scalar = Query::new().from("t").where_(Condition::hash([("active", false)]));
    assert_eq!(param(&build(DialectKind::Mssql, &scalar), ":active1"), Value::Int(0));
    assert_eq!(
        param(&build(DialectKind::Pgsql, &scalar), ":active1"),
        Value::Text("FALSE".into())
    );
}

#[test]
fn inline_boolean_lists_render_literals() {
    let query = Query::new()
        .from("t")
        .where_(Condition::hash([("active", vec![true, false])]));
    let pgsql = qb(DialectKind::Pgsql).inline_values(true).build(&query).unwrap();
    assert_eq!(pgsql.sql, r#"SELECT * FROM "t" WHERE "active" IN (TRUE, FALSE)"#);
    assert_eq!(pgsql.params, None);
    let mysql = qb(DialectKind::Mysql).inline_values(true).build(&query).unwrap();
    assert_eq!(mysql.sql, "SELECT * FROM `t` WHERE `active` IN (1, 0)");
}

#[test]
fn raw_boolean_text_passes_through() {
    assert_eq!(
        where_sql(DialectKind::Pgsql, Condition::raw("active = TRUE")),
        r#"SELECT * FROM "t" WHERE active = TRUE"#
    );
    assert_eq!(
        where_sql(DialectKind::Mysql, "deleted IS FALSE".into()),
        "SELECT * FROM `t` WHERE deleted IS FALSE"
    );
}

// ==================== Clauses ====================

#[test]
fn full_select_clause_order() {
    let query = Query::new()
        .select("u.id, u.name AS title, COUNT(*) AS cnt")
        .from("user u")
        .left_join("profile p", "p.user_id = u.id")
        .where_(Condition::hash([("u.status", 1)]))
        .group_by("u.id, u.name")
        .having(Condition::gt("cnt", 1))
        .order_by("u.id", Order::Desc)
        .limit(10)
        .offset(20);
    assert_eq!(
        build(DialectKind::Mysql, &query).sql,
        "SELECT `u`.`id`, `u`.`name` AS `title`, COUNT(*) AS `cnt` FROM `user` `u` \
         LEFT JOIN `profile` `p` ON p.user_id = u.id WHERE `u`.`status`=:ustatus1 \
         GROUP BY `u`.`id`, `u`.`name` HAVING `cnt` > :cnt2 ORDER BY `u`.`id` DESC \
         LIMIT 10 OFFSET 20"
    );
}

#[test]
fn limit_offset_per_dialect() {
    let query = Query::new().select("id").from("example").limit(10).offset(5);
    assert_eq!(
        build(DialectKind::Mysql, &query).sql,
        "SELECT `id` FROM `example` LIMIT 10 OFFSET 5"
    );
    assert_eq!(
        build(DialectKind::Mssql, &query).sql,
        "SELECT [id] FROM [example] OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    assert_eq!(
        build(DialectKind::Sqlite, &Query::new().from("t").offset(5)).sql,
        "SELECT * FROM `t` LIMIT -1 OFFSET 5"
    );
    assert_eq!(
        build(DialectKind::Pgsql, &query.clone().clear_limit()).sql,
        r#"SELECT "id" FROM "example""#
    );
}

#[test]
fn distinct_modes() {
    let k = DialectKind::Pgsql;
    assert_eq!(
        build(k, &Query::new().select("a").distinct(true).from("t")).sql,
        r#"SELECT DISTINCT "a" FROM "t""#
    );
    assert_eq!(
        build(k, &Query::new().distinct_on(&["a"]).from("t")).sql,
        r#"SELECT DISTINCT ON ("a") * FROM "t""#
    );
    let err = qb(DialectKind::Mysql)
        .build(&Query::new().distinct_on(&["a"]).from("t"))
        .unwrap_err();
    assert!(matches!(err, QueryError::NotSupported { dialect: "mysql", .. }));
}

#[test]
fn joins() {
    assert_eq!(
        build(DialectKind::Mysql, &Query::new().from("a").cross_join("b")).sql,
        "SELECT * FROM `a` CROSS JOIN `b`"
    );
    assert_eq!(
        build(
            DialectKind::Pgsql,
            &Query::new().from("a").full_join("b", Condition::raw("a.id = b.id"))
        )
        .sql,
        r#"SELECT * FROM "a" FULL OUTER JOIN "b" ON a.id = b.id"#
    );
    let err = qb(DialectKind::Sqlite)
        .build(&Query::new().from("a").right_join("b", "a.id = b.id"))
        .unwrap_err();
    assert!(err.is_not_supported());
    let err = qb(DialectKind::Mysql)
        .build(&Query::new().from("a").full_join("b", "a.id = b.id"))
        .unwrap_err();
    assert!(err.is_not_supported());
}

#[test]
fn order_by_forms() {
    let k = DialectKind::Mysql;
    assert_eq!(
        build(k, &Query::new().from("t").order_by_str("created_at desc, id")).sql,
        "SELECT * FROM `t` ORDER BY `created_at` DESC, `id` ASC"
    );
    assert_eq!(
        build(k, &Query::new().from("t").order_by("a", Order::Asc).order_by("a", Order::Desc)).sql,
        "SELECT * FROM `t` ORDER BY `a` DESC"
    );
    assert_eq!(
        build(DialectKind::Mssql, &Query::new().from("t").order_by_random()).sql,
        "SELECT * FROM [t] ORDER BY NEWID()"
    );
    assert_eq!(
        build(DialectKind::Sqlite, &Query::new().from("t").order_by_random()).sql,
        "SELECT * FROM `t` ORDER BY RANDOM()"
    );

    let builder = qb(k);
    let mut ctx = builder.context();
    assert_eq!(
        builder.build_order_by(
            &mut ctx,
            &[
                OrderItem::Random,
                OrderItem::Column {
                    column: "x".into(),
                    order: Order::Asc
                }
            ]
        ),
        "ORDER BY RAND(), `x` ASC"
    );
    assert_eq!(builder.build_order_by(&mut ctx, &[]), "");
    assert_eq!(builder.build_limit(Some(3), None), "LIMIT 3");
}

#[test]
fn unions() {
    let a = Query::new().select("id").from("a");
    let b = Query::new().select("id").from("b");
    assert_eq!(
        build(DialectKind::Mysql, &a.clone().union(b.clone())).sql,
        "(SELECT `id` FROM `a`) UNION (SELECT `id` FROM `b`)"
    );
    assert_eq!(
        build(DialectKind::Sqlite, &a.clone().union_all(b)).sql,
        "SELECT `id` FROM `a` UNION ALL SELECT `id` FROM `b`"
    );
}

#[test]
fn sub_queries_in_from_and_select() {
    let inner = Query::new().from("t").where_(Condition::hash([("a", 1)]));
    let built = build(
        DialectKind::Mysql,
        &Query::new()
            .from_query(inner, "x")
            .where_(Condition::hash([("b", 2)])),
    );
    assert_eq!(
        built.sql,
        "SELECT * FROM (SELECT * FROM `t` WHERE `a`=:a1) `x` WHERE `b`=:b2"
    );

    let count = Query::new()
        .select_expr(Expression::new("COUNT(*)"), None)
        .from("o")
        .where_(Condition::raw("o.uid = u.id"));
    assert_eq!(
        build(
            DialectKind::Mysql,
            &Query::new().select("id").select_query(count, "n").from("user u")
        )
        .sql,
        "SELECT `id`, (SELECT COUNT(*) FROM `o` WHERE o.uid = u.id) AS `n` FROM `user` `u`"
    );
}

#[test]
fn scalar_query_shapes() {
    let k = DialectKind::Mysql;
    let plain = Query::new()
        .select("id")
        .from("t")
        .order_by("id", Order::Asc)
        .limit(5)
        .scalar_query("COUNT(*)");
    assert_eq!(build(k, &plain).sql, "SELECT COUNT(*) FROM `t`");

    let grouped = Query::new().from("t").group_by("a").scalar_query("COUNT(*)");
    assert_eq!(
        build(k, &grouped).sql,
        "SELECT COUNT(*) FROM (SELECT * FROM `t` GROUP BY `a`) `c`"
    );
}

// ==================== Inline mode ====================

#[test]
fn inline_update_literal() {
    let built = qb(DialectKind::Mysql)
        .inline_values(true)
        .update(
            "customer",
            &[("status", 2.into())],
            Some(&Condition::hash([("id", 1)])),
        )
        .unwrap();
    assert_eq!(built.sql, "UPDATE `customer` SET `status`=2 WHERE `id`=1");
    assert!(built.params.is_none());
}

#[test]
fn inline_select_literals() {
    let built = qb(DialectKind::Pgsql)
        .inline_values(true)
        .build(
            &Query::new()
                .from("t")
                .where_(Condition::hash([
                    ("active", Value::Bool(true)),
                    ("name", "O'Neil".into()),
                ])),
        )
        .unwrap();
    assert_eq!(
        built.sql,
        r#"SELECT * FROM "t" WHERE "active"=TRUE AND "name"='O''Neil'"#
    );
}

// ==================== DML ====================

#[test]
fn insert_statements() {
    let k = DialectKind::Mysql;
    let built = qb(k)
        .insert(
            "customer",
            &[
                ("name", "alice".into()),
                ("status", 1.into()),
                ("created", Expression::new("NOW()").into()),
            ],
        )
        .unwrap();
    assert_eq!(
        built.sql,
        "INSERT INTO `customer` (`name`, `status`, `created`) VALUES (:name1, :status2, NOW())"
    );
    assert_eq!(
        qb(DialectKind::Pgsql).insert("t", &[]).unwrap().sql,
        r#"INSERT INTO "t" DEFAULT VALUES"#
    );
    assert_eq!(qb(k).insert("t", &[]).unwrap().sql, "INSERT INTO `t` () VALUES ()");
    assert!(qb(k).insert("t", &[("a", vec![1, 2].into())]).is_err());
}

#[test]
fn insert_from_select() {
    let select = Query::new()
        .select("id")
        .from("t")
        .where_(Condition::hash([("a", 1)]));
    assert_eq!(
        qb(DialectKind::Mysql)
            .insert_from("archive", &["id"], &select)
            .unwrap()
            .sql,
        "INSERT INTO `archive` (`id`) SELECT `id` FROM `t` WHERE `a`=:a1"
    );
}

#[test]
fn batch_insert_binds_every_row() {
    let built = qb(DialectKind::Mysql)
        .batch_insert(
            "t",
            &["a", "b"],
            &[vec![1.into(), "x".into()], vec![2.into(), "y".into()]],
        )
        .unwrap();
    assert_eq!(built.sql, "INSERT INTO `t` (`a`, `b`) VALUES (:a1, :b2), (:a3, :b4)");
    assert_eq!(param(&built, ":b4"), Value::Text("y".into()));
}

#[test]
fn batch_insert_checks_arity_first() {
    let err = qb(DialectKind::Mysql)
        .batch_insert("t", &["a", "b"], &[vec![1.into(), 2.into()], vec![3.into()]])
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::BatchInsertMismatch { row: 1, expected: 2, actual: 1 }
    ));
    assert!(matches!(
        qb(DialectKind::Mysql).batch_insert("t", &["a"], &[]),
        Err(QueryError::Validation(_))
    ));
    assert!(matches!(
        qb(DialectKind::Mysql).batch_insert("t", &[], &[vec![]]),
        Err(QueryError::Validation(_))
    ));
}

#[test]
fn update_and_delete() {
    let k = DialectKind::Mysql;
    assert_eq!(
        qb(k)
            .update("customer", &[("status", 2.into())], Some(&Condition::hash([("id", 1)])))
            .unwrap()
            .sql,
        "UPDATE `customer` SET `status`=:status1 WHERE `id`=:id2"
    );
    assert!(matches!(
        qb(k).update("customer", &[], None),
        Err(QueryError::Validation(_))
    ));
    assert_eq!(
        qb(DialectKind::Pgsql)
            .delete("t", Some(&Condition::hash([("id", 3)])))
            .unwrap()
            .sql,
        r#"DELETE FROM "t" WHERE "id"=:id1"#
    );
    assert_eq!(qb(DialectKind::Pgsql).delete("t", None).unwrap().sql, r#"DELETE FROM "t""#);
    assert_eq!(qb(DialectKind::Sqlite).truncate_table("t").sql, "DELETE FROM `t`");
    assert_eq!(qb(DialectKind::Mysql).truncate_table("t").sql, "TRUNCATE TABLE `t`");
    assert_eq!(qb(DialectKind::Mssql).drop_table("t").sql, "DROP TABLE [t]");
}

#[test]
fn schema_typecasts_dml_values() {
    let registry = SchemaRegistry::new().with_table(
        TableSchema::new("customer")
            .with_column(ColumnSchema::new("status", ColumnType::Integer, "int"))
            .with_column(ColumnSchema::new("active", ColumnType::Boolean, "tinyint(1)")),
    );
    let columns: [(&str, Operand); 3] = [
        ("status", "2".into()),
        ("active", "1".into()),
        ("note", "x".into()),
    ];

    let built = qb(DialectKind::Mysql)
        .with_schema(&registry)
        .insert("customer", &columns)
        .unwrap();
    assert_eq!(param(&built, ":status1"), Value::Int(2));
    assert_eq!(param(&built, ":active2"), Value::Int(1));
    assert_eq!(param(&built, ":note3"), Value::Text("x".into()));

    let built = qb(DialectKind::Pgsql)
        .with_schema(&registry)
        .update("customer", &columns, None)
        .unwrap();
    assert_eq!(param(&built, ":active2"), Value::Text("TRUE".into()));

    // without a schema values are bound as given
    let built = qb(DialectKind::Mysql).insert("customer", &columns).unwrap();
    assert_eq!(param(&built, ":status1"), Value::Text("2".into()));
}

// ==================== Positional ====================

#[test]
fn positional_placeholders() {
    let built = Built::new(
        "SELECT * FROM t WHERE a = :a1 AND b::text = ':a1' AND c = :c2 AND d = :missing".to_string(),
        Params::new().with("a1", 1).with("c2", "x"),
    );
    let (sql, values) = built.to_positional(PlaceholderStyle::Question);
    assert_eq!(
        sql,
        "SELECT * FROM t WHERE a = ? AND b::text = ':a1' AND c = ? AND d = :missing"
    );
    assert_eq!(values, vec![Value::Int(1), Value::Text("x".into())]);

    let (sql, _) = built.to_positional(PlaceholderStyle::Dollar);
    assert_eq!(
        sql,
        "SELECT * FROM t WHERE a = $1 AND b::text = ':a1' AND c = $2 AND d = :missing"
    );
}

#[test]
fn built_without_params_has_none() {
    let built = build(DialectKind::Mysql, &Query::new().from("t"));
    assert_eq!(built.sql, "SELECT * FROM `t`");
    assert_eq!(built.params, None);
    assert_eq!(build(DialectKind::Mysql, &Query::new()).sql, "SELECT *");
}
